use crate::config::ExtractorConfig;
use crate::error::{Result, TimelineError};
use crate::parsers::dates::coerce_date;
use crate::timeline::Bucket;
use log::{debug, trace};

const RANGE_SEPARATOR: &str = " to ";

/// Split a bucket header of the form `<label>\n<start> to <end>` into its two
/// raw date strings.
///
/// Only the text after the last line break is considered. Returns `None` if
/// there is no line break or the remainder does not split into exactly two
/// parts.
pub fn split_bucket_header(header: &str) -> Option<(&str, &str)> {
    let (_, dates) = header.rsplit_once('\n')?;
    let parts: Vec<&str> = dates.trim().split(RANGE_SEPARATOR).collect();
    match parts.as_slice() {
        [start, end] => Some((start.trim(), end.trim())),
        _ => None,
    }
}

/// Derive the ordered bucket sequence from a header row.
///
/// The first `identity_columns` headers are never buckets. After them, every
/// header matching the marker must parse into a date range; a header that
/// fails is an error rather than a skipped column, since dropping it would
/// shift every later bucket onto the wrong cell.
pub fn parse_buckets(headers: &[String], config: &ExtractorConfig) -> Result<Vec<Bucket>> {
    let marker = config.marker()?;
    let identity_columns = config.identity_columns;

    if headers.len() < identity_columns {
        return Err(TimelineError::InvalidLayout(format!(
            "expected at least {} identity columns, found {} headers",
            identity_columns,
            headers.len()
        )));
    }

    if let Some((column, header)) = headers[..identity_columns]
        .iter()
        .enumerate()
        .find(|(_, header)| marker.is_match(header))
    {
        return Err(TimelineError::InvalidLayout(format!(
            "identity column {} ('{}') matches bucket marker '{}'",
            column, header, config.bucket_marker
        )));
    }

    let mut buckets: Vec<Bucket> = Vec::new();
    for (column, header) in headers.iter().enumerate().skip(identity_columns) {
        if !marker.is_match(header) {
            trace!("Skipping non-bucket column {}: {:?}", column, header);
            continue;
        }

        let bucket = parse_bucket(column, header, &config.date_formats)?;
        if let Some(previous) = buckets.last() {
            if bucket.range_start < previous.range_start {
                return Err(TimelineError::InvalidLayout(format!(
                    "bucket '{}' starts on {} before the preceding bucket '{}' ({})",
                    bucket.label, bucket.range_start, previous.label, previous.range_start
                )));
            }
        }
        buckets.push(bucket);
    }

    if buckets.is_empty() {
        return Err(TimelineError::InvalidLayout(format!(
            "no headers match bucket marker '{}'",
            config.bucket_marker
        )));
    }

    debug!(
        "Parsed {} buckets spanning {} to {}",
        buckets.len(),
        buckets[0].range_start,
        buckets[buckets.len() - 1].range_end
    );

    Ok(buckets)
}

fn parse_bucket(column: usize, header: &str, formats: &[String]) -> Result<Bucket> {
    let malformed = |reason: &str| TimelineError::MalformedBucketHeader {
        column,
        label: header.to_string(),
        reason: reason.to_string(),
    };

    let (start, end) = split_bucket_header(header)
        .ok_or_else(|| malformed("expected '<label>\\n<start> to <end>'"))?;

    let context = format!("bucket header {:?} (column {})", header, column);
    let range_start = coerce_date(start, formats, &context)?;
    let range_end = coerce_date(end, formats, &context)?;

    if range_start > range_end {
        return Err(malformed("range starts after it ends"));
    }

    Ok(Bucket::new(header.to_string(), column, range_start, range_end))
}
