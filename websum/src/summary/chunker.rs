use super::normalize::normalize;
use super::SummarizeError;

/// One overlapping window of normalized text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position in the chunk sequence, starting at 0
    pub index: usize,
    /// Offset of the first character, counted in chars
    pub start: usize,
    pub text: String,
}

/// Normalize `text` and cut it into windows of `chunk_size` characters whose start
/// offsets advance by `chunk_size - floor(chunk_size * overlap_fraction)`.
///
/// Empty (or noise-only) input yields no chunks. The last chunk may be shorter.
pub fn split(text: &str, chunk_size: usize, overlap_fraction: f64) -> Result<Vec<Chunk>, SummarizeError> {
    let stride = stride(chunk_size, overlap_fraction)?;

    let normalized = normalize(text);
    // Byte offset of every char, plus the end, so windows never split a code point
    let bounds: Vec<usize> = normalized
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(normalized.len()))
        .collect();
    let char_len = bounds.len() - 1;

    let chunks = (0..char_len)
        .step_by(stride)
        .enumerate()
        .map(|(index, start)| {
            let end = (start + chunk_size).min(char_len);
            Chunk {
                index,
                start,
                text: normalized[bounds[start]..bounds[end]].to_string(),
            }
        })
        .collect();

    Ok(chunks)
}

/// Distance between consecutive chunk starts, validating the parameters.
pub fn stride(chunk_size: usize, overlap_fraction: f64) -> Result<usize, SummarizeError> {
    if chunk_size == 0 {
        return Err(SummarizeError::InvalidParameter(
            "chunk_size must be greater than zero".to_string(),
        ));
    }
    if !(0.0..1.0).contains(&overlap_fraction) {
        return Err(SummarizeError::InvalidParameter(format!(
            "overlap_fraction must be in [0, 1), got {}",
            overlap_fraction
        )));
    }

    let overlap = (chunk_size as f64 * overlap_fraction).floor() as usize;
    let stride = chunk_size.saturating_sub(overlap);
    if stride == 0 {
        return Err(SummarizeError::InvalidParameter(format!(
            "chunk_size {} with overlap_fraction {} leaves no forward progress",
            chunk_size, overlap_fraction
        )));
    }
    Ok(stride)
}
