//! Recording-site names from per-site file names.
//!
//! Single-site recordings are named like `A1_ARM031a_<hash>.tgz`; the site is
//! the token between `A1_` and the next `_`.
use std::collections::BTreeMap;

/// Site identifier embedded in a single-site file name.
///
/// ```
/// assert_eq!(stimlag::sites::site_name("A1_ARM031a_7f9e2c.tgz"), Some("ARM031a"));
/// assert_eq!(stimlag::sites::site_name("PEG_ARM031a.tgz"), None);
/// ```
pub fn site_name(file_name: &str) -> Option<&str> {
    let start = file_name.find("A1_")? + 3;
    let len = file_name[start..].find('_')?;
    Some(&file_name[start..start + len])
}

/// Number of files per site, keyed by site name.  Unrecognised names are
/// skipped.
pub fn count_sites<S: AsRef<str>>(file_names: &[S]) -> BTreeMap<String, usize> {
    let mut sites = BTreeMap::new();
    for name in file_names {
        if let Some(site) = site_name(name.as_ref()) {
            *sites.entry(site.to_string()).or_insert(0) += 1;
        }
    }
    sites
}
