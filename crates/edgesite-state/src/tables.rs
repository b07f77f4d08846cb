//! redb table definitions.

use redb::TableDefinition;

/// Published function versions keyed by `{function}/{tag}`.
pub const FUNCTION_VERSIONS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("function_versions");

/// Current edge bindings keyed by `{distribution}/{event}`.
pub const EDGE_BINDINGS: TableDefinition<&str, &[u8]> = TableDefinition::new("edge_bindings");
