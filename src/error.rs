/// Errors reported by [`BlockParser::incorporate_line`](crate::BlockParser::incorporate_line).
///
/// These only arise from misuse of the incremental interface, such as
/// feeding lines after the document has been finalized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IncorporateError {
    #[error("line {line_number}: attempted to add content to closed {kind} block")]
    ClosedContainer {
        line_number: usize,
        kind: &'static str,
    },
}

impl IncorporateError {
    pub fn line_number(&self) -> usize {
        match self {
            IncorporateError::ClosedContainer { line_number, .. } => *line_number,
        }
    }
}
