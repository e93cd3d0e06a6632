use std::collections::HashSet;

use indexmap::IndexMap;

use crate::annotations::IMPORT;
use crate::error::Result;
use crate::source_class::{SourceClass, SourceClassResolver};

/// Every class named by `@Import` on `source`, including imports declared on its
/// meta-annotations, in first-discovery order.
pub fn collect_imports(resolver: &SourceClassResolver, source: &SourceClass) -> Result<Vec<SourceClass>> {
    let mut imports = IndexMap::new();
    let mut visited = HashSet::new();
    collect(resolver, source, &mut imports, &mut visited)?;
    Ok(imports.into_values().collect())
}

fn collect(
    resolver: &SourceClassResolver,
    source: &SourceClass,
    imports: &mut IndexMap<String, SourceClass>,
    visited: &mut HashSet<String>,
) -> Result<()> {
    if !visited.insert(source.name().to_string()) {
        return Ok(());
    }
    for annotation in resolver.annotations(source) {
        if annotation.name() != IMPORT {
            collect(resolver, &annotation, imports, visited)?;
        }
    }
    for imported in resolver.annotation_attribute_classes(source, IMPORT, "value")? {
        imports.entry(imported.name().to_string()).or_insert(imported);
    }
    Ok(())
}
