//! Locating `vc_archive` from the crate that invokes the derive.
//!
//! Generated code cannot name `crate::` or rely on the crate being in
//! scope, so the path is resolved from the caller's `Cargo.toml`.

use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use std::time::SystemTime;

use toml_edit::{Document, Item, Table};

const CRATE_NAME: &str = "vc_archive";

/// Path of the `vc_archive` crate as seen by the invoking crate.
///
/// 1. A dependency named `vc_archive` gives `::vc_archive`.
/// 2. A dependency renamed with `package = "vc_archive"` gives `::<key>`.
/// 3. Steps 1-2 are repeated on `dev-dependencies`.
/// 4. Otherwise `::vc_archive`, which is also right inside `vc_archive`
///    itself thanks to its `extern crate self as vc_archive`.
pub(crate) fn vc_archive() -> syn::Path {
    let Some(manifest_path) = manifest_path() else {
        return fallback();
    };

    let name = cached_lookup(&manifest_path).unwrap_or_else(|| CRATE_NAME.to_owned());
    syn::parse_str(&format!("::{name}")).unwrap_or_else(|_| fallback())
}

fn fallback() -> syn::Path {
    let ident = syn::Ident::new(CRATE_NAME, proc_macro2::Span::call_site());
    syn::parse_quote!(::#ident)
}

fn manifest_path() -> Option<PathBuf> {
    let mut path = PathBuf::from(env::var_os("CARGO_MANIFEST_DIR")?);
    path.push("Cargo.toml");
    path.exists().then_some(path)
}

struct Cached {
    modified: SystemTime,
    name: Option<String>,
}

/// Looks the crate up once per manifest revision.
fn cached_lookup(path: &Path) -> Option<String> {
    static CACHE: RwLock<BTreeMap<PathBuf, Cached>> = RwLock::new(BTreeMap::new());

    let modified = std::fs::metadata(path).and_then(|m| m.modified()).ok()?;

    let cache = CACHE.read().unwrap_or_else(PoisonError::into_inner);
    if let Some(cached) = cache.get(path)
        && cached.modified == modified
    {
        return cached.name.clone();
    }
    drop(cache);

    let name = read_dependency_name(path);

    CACHE.write().unwrap_or_else(PoisonError::into_inner).insert(
        path.to_path_buf(),
        Cached {
            modified,
            name: name.clone(),
        },
    );

    name
}

fn read_dependency_name(path: &Path) -> Option<String> {
    let text = std::fs::read_to_string(path).ok()?;
    let manifest = Document::parse(text).ok()?;

    ["dependencies", "dev-dependencies"]
        .into_iter()
        .filter_map(|section| match manifest.get(section) {
            Some(Item::Table(deps)) => find_in_deps(deps),
            _ => None,
        })
        .next()
}

fn find_in_deps(deps: &Table) -> Option<String> {
    if deps.contains_key(CRATE_NAME) {
        return Some(CRATE_NAME.to_owned());
    }

    deps.iter().find_map(|(key, item)| {
        let package = item.get("package")?.as_str()?;
        (package == CRATE_NAME).then(|| key.replace('-', "_"))
    })
}
