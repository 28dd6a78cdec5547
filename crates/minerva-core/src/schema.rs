/// Column names and Arrow schema for the screening sheet.
pub mod sheet {
    use arrow::datatypes::{DataType, Field, Schema};

    /// Row identifier assigned by the remote store.
    pub const ROW: &str = "_row";
    pub const SR: &str = "SR";
    pub const TITLE: &str = "Title";
    pub const ABSTRACT: &str = "Abstract";
    pub const DECISION: &str = "Poenaru_Decision";
    pub const AI: &str = "AI";
    pub const AI_JUSTIFICATION: &str = "AI_Justification";
    pub const REVIEWER: &str = "Reviewer";
    pub const REVIEWED_AT: &str = "Reviewed_At";

    /// Columns of the local prompt table.
    pub const PROMPT_SR: &str = "SR";
    pub const PROMPT_TEXT: &str = "Prompt";

    /// Fields the remote store accepts in a partial update.
    pub const WRITABLE: &[&str] = &[DECISION, AI, AI_JUSTIFICATION, REVIEWER, REVIEWED_AT];

    /// Schema for a snapshot export, one row per record in `_row` order.
    pub fn snapshot_schema() -> Schema {
        Schema::new(vec![
            Field::new(ROW, DataType::Int64, false),
            Field::new(SR, DataType::Int64, false),
            Field::new(TITLE, DataType::Utf8, false),
            Field::new(ABSTRACT, DataType::Utf8, false),
            Field::new(DECISION, DataType::Utf8, false),
            Field::new(AI, DataType::Utf8, false),
            Field::new(AI_JUSTIFICATION, DataType::Utf8, false),
            Field::new(REVIEWER, DataType::Utf8, false),
            Field::new(REVIEWED_AT, DataType::Utf8, false),
        ])
    }
}
