pub mod ai_assessment;
pub mod bias;
pub mod cost;
pub mod gate_result;
pub mod indicator_facts;
pub mod run_type;
pub mod stage;
pub mod system_context;
