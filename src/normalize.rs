//! Region name canonicalization shared by every data source.
//!
//! Boundary files carry the full hierarchy ("서울특별시 종로구 청운·효자동")
//! while the statistics tables carry only the dong name, sometimes with `.`
//! where the boundary file uses `·`. Both sides go through [`canonical_key`].

const MIDDLE_DOT: &str = "·";

/// Keeps the finest-grained unit (last whitespace token) and unifies dots.
pub fn canonical_key(raw: &str) -> String {
    let last = raw.split_whitespace().last().unwrap_or("");
    replace_dots(last)
}

pub fn replace_dots(name: &str) -> String {
    name.replace('.', MIDDLE_DOT)
}
