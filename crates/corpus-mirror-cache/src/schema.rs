use rusqlite_migration::{M, Migrations};

pub fn migrations() -> Migrations<'static> {
    Migrations::new(vec![M::up(
        "CREATE TABLE metadata_files (
            key             TEXT PRIMARY KEY,
            stamp           TEXT NOT NULL,
            indexed_at      TEXT NOT NULL
        );

        CREATE TABLE documents (
            id              TEXT NOT NULL,
            metadata_key    TEXT NOT NULL,
            position        INTEGER NOT NULL,
            path            TEXT NOT NULL,
            language        TEXT NOT NULL,
            PRIMARY KEY (metadata_key, position),
            FOREIGN KEY (metadata_key) REFERENCES metadata_files(key)
        );

        CREATE INDEX idx_documents_id ON documents(id);
        CREATE INDEX idx_documents_language ON documents(language);",
    )])
}
