use std::collections::BTreeSet;
use std::fs::File;
use std::path::Path;

use super::model::{NeighborGraph, Position};
use crate::error::{ProbeError, Result};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load channel positions: one `x,y` integer pair per line, line order is
/// channel order.
pub fn load_positions(path: &Path) -> Result<Vec<Position>> {
    let mut positions = Vec::new();

    for_each_line(path, |line, fields| {
        let [x, y] = fields else {
            return Err(ProbeError::format(
                path,
                format!("line {line}: expected 'x,y', got {} fields", fields.len()),
            ));
        };
        let x = parse_field::<i64>(path, line, x)?;
        let y = parse_field::<i64>(path, line, y)?;
        positions.push(Position::new(x, y));
        Ok(())
    })?;

    Ok(positions)
}

/// Load a neighbor matrix: line `i` lists the channel ids neighboring
/// channel `i`.
pub fn load_neighbors(path: &Path) -> Result<NeighborGraph> {
    let mut sets = Vec::new();

    for_each_line(path, |line, fields| {
        let set = fields
            .iter()
            .map(|tok| parse_field::<usize>(path, line, tok))
            .collect::<Result<BTreeSet<usize>>>()?;
        sets.push((line, set));
        Ok(())
    })?;

    let n_channels = sets.len();
    for (line, set) in &sets {
        if let Some(&bad) = set.iter().find(|&&id| id >= n_channels) {
            return Err(ProbeError::format(
                path,
                format!("line {line}: channel id {bad} out of range for {n_channels} channels"),
            ));
        }
    }

    Ok(NeighborGraph::from_sets(
        sets.into_iter().map(|(_, set)| set).collect(),
    ))
}

// -- Line helpers --

/// Walk a headerless comma-separated file, handing each record's trimmed
/// fields to `f` together with its 1-based line number. A trailing empty
/// field (line ending in a comma) is dropped. Blank lines are allowed only
/// at the end of the file, since a gap would shift every later channel id.
fn for_each_line<F>(path: &Path, mut f: F) -> Result<()>
where
    F: FnMut(u64, &[&str]) -> Result<()>,
{
    let file = File::open(path).map_err(|e| ProbeError::io(path, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut next_line = 1;
    let mut first_blank: Option<u64> = None;
    for result in reader.records() {
        let record = result.map_err(|e| ProbeError::format(path, e.to_string()))?;
        let line = record.position().map(|p| p.line()).unwrap_or(next_line);
        // the reader skips empty lines, which shows up as a jump in line numbers
        if line > next_line {
            first_blank.get_or_insert(next_line);
        }
        next_line = line + 1;

        let mut fields: Vec<&str> = record.iter().collect();
        while fields.last().is_some_and(|tok| tok.is_empty()) {
            fields.pop();
        }
        if fields.is_empty() {
            first_blank.get_or_insert(line);
            continue;
        }
        if let Some(blank) = first_blank {
            return Err(ProbeError::format(
                path,
                format!("line {blank}: blank line before line {line}"),
            ));
        }
        f(line, &fields)?;
    }
    Ok(())
}

fn parse_field<T: std::str::FromStr>(path: &Path, line: u64, tok: &str) -> Result<T> {
    tok.parse::<T>().map_err(|_| {
        ProbeError::format(path, format!("line {line}: '{tok}' is not a valid integer"))
    })
}
