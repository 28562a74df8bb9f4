//! Table definitions for the knowledge base

/// Idempotent; safe to run against an existing database
pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS gene (
    symbol                TEXT PRIMARY KEY,
    chromo_sequence_id    TEXT,
    protein_sequence_id   TEXT,
    gene_sequence_id      TEXT,
    mrna_sequence_id      TEXT,
    alleles_last_modified TEXT,
    function_methods      TEXT,
    frequency_methods     TEXT
);

CREATE TABLE IF NOT EXISTS sequence_location (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    gene_symbol         TEXT NOT NULL REFERENCES gene(symbol),
    name                TEXT NOT NULL,
    protein_location    TEXT,
    chromosome_location TEXT,
    gene_location       TEXT,
    dbsnp_id            TEXT,
    UNIQUE (gene_symbol, name)
);

CREATE TABLE IF NOT EXISTS allele_definition (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    gene_symbol TEXT NOT NULL REFERENCES gene(symbol),
    name        TEXT NOT NULL,
    UNIQUE (gene_symbol, name)
);

CREATE TABLE IF NOT EXISTS allele_location_value (
    allele_definition_id INTEGER NOT NULL REFERENCES allele_definition(id),
    location_id          INTEGER NOT NULL REFERENCES sequence_location(id),
    variant_allele       TEXT NOT NULL,
    PRIMARY KEY (allele_definition_id, location_id)
);

-- keyed by allele name so it never depends on allele_definition row ids
CREATE TABLE IF NOT EXISTS allele_function (
    id                       INTEGER PRIMARY KEY AUTOINCREMENT,
    gene_symbol              TEXT NOT NULL REFERENCES gene(symbol),
    allele_name              TEXT NOT NULL,
    activity_value           TEXT,
    function_status          TEXT,
    clinical_function_status TEXT,
    clinical_substrate       TEXT,
    citations                TEXT NOT NULL DEFAULT '[]',
    strength                 TEXT,
    findings                 TEXT,
    comments                 TEXT,
    UNIQUE (gene_symbol, allele_name)
);

CREATE TABLE IF NOT EXISTS population (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    gene_symbol      TEXT NOT NULL REFERENCES gene(symbol),
    authors          TEXT,
    year             INTEGER,
    citation         TEXT,
    population_group TEXT,
    name             TEXT NOT NULL,
    info             TEXT,
    subject_count    INTEGER
);

CREATE TABLE IF NOT EXISTS allele_frequency (
    population_id INTEGER NOT NULL REFERENCES population(id),
    allele_name   TEXT NOT NULL,
    frequency     TEXT NOT NULL,
    PRIMARY KEY (population_id, allele_name)
);

CREATE TABLE IF NOT EXISTS file_note (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    entity_key TEXT NOT NULL,
    type       TEXT NOT NULL,
    ordinal    INTEGER NOT NULL,
    note       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS change_log (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    entity_key TEXT NOT NULL,
    type       TEXT NOT NULL,
    ordinal    INTEGER NOT NULL,
    date       TEXT NOT NULL,
    note       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS file_history (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    file_name   TEXT NOT NULL,
    type        TEXT NOT NULL,
    action      TEXT NOT NULL,
    entity_keys TEXT NOT NULL DEFAULT '[]',
    url         TEXT,
    recorded_at TEXT NOT NULL
);
";
