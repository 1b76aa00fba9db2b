use danmaku_protocol::Comment;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("invalid comment JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decode a JSON array of comments and order it by arrival time.
///
/// The sort is stable, so comments sharing a timestamp keep their file
/// order, which is the order they will be admitted in.
///
/// ```text
/// [{"time_ms": 1200, "kind": "scroll_r2l", "text": "hello", "size": 25, "color": 16777215}]
/// ```
///
/// The kind may also be given as a numeric `mode`: 1 scrolls right to left,
/// 6 left to right, 5 is pinned to the top and 4 to the bottom.
pub fn parse_json(data: &[u8]) -> Result<Vec<Comment>, SourceError> {
    let mut comments: Vec<Comment> = serde_json::from_slice(data)?;
    comments.sort_by_key(|c| c.time_ms);
    tracing::debug!(count = comments.len(), "loaded comment source");
    Ok(comments)
}
