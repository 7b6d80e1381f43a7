pub mod schema_auditor;

pub use schema_auditor::{AuditReport, ColumnMismatch, FileFinding, SchemaAuditor};
