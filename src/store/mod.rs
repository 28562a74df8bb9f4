//! Relational store backed by SQLite
//!
//! The knowledge base tables, the reads the exporters need and the writes
//! the importers issue. All calls are synchronous; a [`Store`] is meant to
//! be used by one run at a time.

mod schema;

pub use schema::SCHEMA;

use crate::error::{ArtifactError, ArtifactResult};
use crate::types::{
    AlleleFrequency, FileType, FunctionReference, FunctionStatus, GeneHeader, HistoryEntry,
    Location, LocationValue, PopulationFrequencies, ProvenanceAction, ProvenanceRecord,
};
use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> ArtifactResult<Self> {
        Self::configure(Connection::open(path)?)
    }

    pub fn open_in_memory() -> ArtifactResult<Self> {
        Self::configure(Connection::open_in_memory()?)
    }

    fn configure(conn: Connection) -> ArtifactResult<Self> {
        // PRAGMA settings are per connection
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Create any missing tables
    pub fn init_schema(&self) -> ArtifactResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Run parameterless statements in order, returning the total rows affected
    pub fn execute_all(&self, statements: &[&str]) -> ArtifactResult<usize> {
        let mut affected = 0;
        for sql in statements {
            affected += self.conn.execute(sql, [])?;
        }
        Ok(affected)
    }

    /// Row count of a table. The name is not escaped; pass literals only.
    pub fn count_rows(&self, table: &str) -> ArtifactResult<i64> {
        let count = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        Ok(count)
    }

    //==========================================================================
    // Genes (reference data)
    //==========================================================================

    /// Insert a gene or refresh its header fields
    pub fn upsert_gene(&self, gene: &GeneHeader) -> ArtifactResult<()> {
        self.conn.execute(
            "INSERT INTO gene (symbol, chromo_sequence_id, protein_sequence_id, gene_sequence_id,
                               mrna_sequence_id, alleles_last_modified)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(symbol) DO UPDATE SET
                 chromo_sequence_id = excluded.chromo_sequence_id,
                 protein_sequence_id = excluded.protein_sequence_id,
                 gene_sequence_id = excluded.gene_sequence_id,
                 mrna_sequence_id = excluded.mrna_sequence_id,
                 alleles_last_modified = excluded.alleles_last_modified",
            params![
                gene.symbol,
                gene.chromo_sequence_id,
                gene.protein_sequence_id,
                gene.gene_sequence_id,
                gene.mrna_sequence_id,
                gene.alleles_last_modified.map(format_date),
            ],
        )?;
        Ok(())
    }

    pub fn gene_exists(&self, symbol: &str) -> ArtifactResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM gene WHERE symbol = ?1",
            params![symbol],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn gene_header(&self, symbol: &str) -> ArtifactResult<Option<GeneHeader>> {
        let raw = self
            .conn
            .query_row(
                "SELECT symbol, chromo_sequence_id, protein_sequence_id, gene_sequence_id,
                        mrna_sequence_id, alleles_last_modified
                 FROM gene WHERE symbol = ?1",
                params![symbol],
                |row| {
                    Ok((
                        GeneHeader {
                            symbol: row.get(0)?,
                            chromo_sequence_id: row.get(1)?,
                            protein_sequence_id: row.get(2)?,
                            gene_sequence_id: row.get(3)?,
                            mrna_sequence_id: row.get(4)?,
                            alleles_last_modified: None,
                        },
                        row.get::<_, Option<String>>(5)?,
                    ))
                },
            )
            .optional()?;

        raw.map(|(mut gene, modified)| {
            gene.alleles_last_modified = modified.as_deref().map(parse_date).transpose()?;
            Ok(gene)
        })
        .transpose()
    }

    /// Overwrite the header fields an allele definition artifact carries.
    /// Fields absent from the artifact keep their stored value.
    pub fn update_definition_header(&self, gene: &GeneHeader) -> ArtifactResult<()> {
        self.conn.execute(
            "UPDATE gene SET
                 alleles_last_modified = COALESCE(?2, alleles_last_modified),
                 chromo_sequence_id = COALESCE(?3, chromo_sequence_id),
                 protein_sequence_id = COALESCE(?4, protein_sequence_id),
                 gene_sequence_id = COALESCE(?5, gene_sequence_id),
                 mrna_sequence_id = COALESCE(?6, mrna_sequence_id)
             WHERE symbol = ?1",
            params![
                gene.symbol,
                gene.alleles_last_modified.map(format_date),
                gene.chromo_sequence_id,
                gene.protein_sequence_id,
                gene.gene_sequence_id,
                gene.mrna_sequence_id,
            ],
        )?;
        Ok(())
    }

    pub fn set_function_methods(&self, symbol: &str, methods: Option<&str>) -> ArtifactResult<()> {
        self.conn.execute(
            "UPDATE gene SET function_methods = ?2 WHERE symbol = ?1",
            params![symbol, methods],
        )?;
        Ok(())
    }

    pub fn function_methods(&self, symbol: &str) -> ArtifactResult<Option<String>> {
        let methods = self
            .conn
            .query_row(
                "SELECT function_methods FROM gene WHERE symbol = ?1",
                params![symbol],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?;
        Ok(methods.flatten())
    }

    pub fn genes_with_definitions(&self) -> ArtifactResult<Vec<String>> {
        self.strings("SELECT DISTINCT gene_symbol FROM allele_definition ORDER BY 1", params![])
    }

    pub fn genes_with_function_references(&self) -> ArtifactResult<Vec<String>> {
        self.strings("SELECT DISTINCT gene_symbol FROM allele_function ORDER BY 1", params![])
    }

    pub fn genes_with_frequencies(&self) -> ArtifactResult<Vec<String>> {
        self.strings("SELECT DISTINCT gene_symbol FROM population ORDER BY 1", params![])
    }

    pub fn set_frequency_methods(&self, symbol: &str, methods: Option<&str>) -> ArtifactResult<()> {
        self.conn.execute(
            "UPDATE gene SET frequency_methods = ?2 WHERE symbol = ?1",
            params![symbol, methods],
        )?;
        Ok(())
    }

    pub fn frequency_methods(&self, symbol: &str) -> ArtifactResult<Option<String>> {
        let methods = self
            .conn
            .query_row(
                "SELECT frequency_methods FROM gene WHERE symbol = ?1",
                params![symbol],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?;
        Ok(methods.flatten())
    }

    //==========================================================================
    // Allele definitions
    //==========================================================================

    /// Insert a location; `location.id` is ignored and the new id returned
    pub fn insert_location(&self, gene: &str, location: &Location) -> ArtifactResult<i64> {
        self.conn.execute(
            "INSERT INTO sequence_location (gene_symbol, name, protein_location,
                                            chromosome_location, gene_location, dbsnp_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                gene,
                location.name,
                location.protein_location,
                location.chromosome_location,
                location.gene_location,
                location.dbsnp_id,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Locations in insertion order, which is the column order of the artifact
    pub fn locations(&self, gene: &str) -> ArtifactResult<Vec<Location>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, protein_location, chromosome_location, gene_location, dbsnp_id
             FROM sequence_location WHERE gene_symbol = ?1 ORDER BY id",
        )?;
        let locations = stmt
            .query_map(params![gene], |row| {
                Ok(Location {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    protein_location: row.get(2)?,
                    chromosome_location: row.get(3)?,
                    gene_location: row.get(4)?,
                    dbsnp_id: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(locations)
    }

    pub fn insert_allele_definition(&self, gene: &str, name: &str) -> ArtifactResult<i64> {
        self.conn.execute(
            "INSERT INTO allele_definition (gene_symbol, name) VALUES (?1, ?2)",
            params![gene, name],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// (id, name) pairs in insertion order
    pub fn allele_definitions(&self, gene: &str) -> ArtifactResult<Vec<(i64, String)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM allele_definition WHERE gene_symbol = ?1 ORDER BY id")?;
        let alleles = stmt
            .query_map(params![gene], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(alleles)
    }

    /// Allele name -> id lookup for resolving curated rows
    pub fn allele_definition_ids(&self, gene: &str) -> ArtifactResult<HashMap<String, i64>> {
        Ok(self
            .allele_definitions(gene)?
            .into_iter()
            .map(|(id, name)| (name, id))
            .collect())
    }

    pub fn insert_location_value(
        &self,
        allele_id: i64,
        location_id: i64,
        variant_allele: &str,
    ) -> ArtifactResult<()> {
        self.conn.execute(
            "INSERT INTO allele_location_value (allele_definition_id, location_id, variant_allele)
             VALUES (?1, ?2, ?3)",
            params![allele_id, location_id, variant_allele],
        )?;
        Ok(())
    }

    pub fn location_values(&self, allele_id: i64) -> ArtifactResult<Vec<LocationValue>> {
        let mut stmt = self.conn.prepare(
            "SELECT location_id, variant_allele FROM allele_location_value
             WHERE allele_definition_id = ?1 ORDER BY location_id",
        )?;
        let values = stmt
            .query_map(params![allele_id], |row| {
                Ok(LocationValue {
                    location_id: row.get(0)?,
                    variant_allele: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(values)
    }

    //==========================================================================
    // Allele function references
    //==========================================================================

    pub fn insert_function_reference(
        &self,
        gene: &str,
        reference: &FunctionReference,
    ) -> ArtifactResult<()> {
        let citations = serde_json::to_string(&reference.citations)
            .map_err(|e| ArtifactError::Export(format!("Failed to encode citations: {}", e)))?;
        self.conn.execute(
            "INSERT INTO allele_function (gene_symbol, allele_name, activity_value, function_status,
                                          clinical_function_status, clinical_substrate, citations,
                                          strength, findings, comments)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                gene,
                reference.allele_name,
                reference.activity_value,
                reference.function_status.map(|s| s.label()),
                reference.clinical_function_status.map(|s| s.label()),
                reference.clinical_substrate,
                citations,
                reference.strength,
                reference.findings,
                reference.comments,
            ],
        )?;
        Ok(())
    }

    pub fn function_references(&self, gene: &str) -> ArtifactResult<Vec<FunctionReference>> {
        let mut stmt = self.conn.prepare(
            "SELECT allele_name, activity_value, function_status, clinical_function_status,
                    clinical_substrate, citations, strength, findings, comments
             FROM allele_function WHERE gene_symbol = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![gene], |row| {
                Ok(RawFunctionRow {
                    allele_name: row.get(0)?,
                    activity_value: row.get(1)?,
                    function_status: row.get(2)?,
                    clinical_function_status: row.get(3)?,
                    clinical_substrate: row.get(4)?,
                    citations: row.get(5)?,
                    strength: row.get(6)?,
                    findings: row.get(7)?,
                    comments: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(RawFunctionRow::into_reference).collect()
    }

    /// Allele name -> functional status for one gene
    pub fn function_statuses(&self, gene: &str) -> ArtifactResult<HashMap<String, FunctionStatus>> {
        Ok(self
            .function_references(gene)?
            .into_iter()
            .filter_map(|r| r.function_status.map(|s| (r.allele_name, s)))
            .collect())
    }

    //==========================================================================
    // Population frequencies
    //==========================================================================

    /// Insert a population row without its frequencies; returns the new id
    pub fn insert_population(
        &self,
        gene: &str,
        population: &PopulationFrequencies,
    ) -> ArtifactResult<i64> {
        self.conn.execute(
            "INSERT INTO population (gene_symbol, authors, year, citation, population_group,
                                     name, info, subject_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                gene,
                population.authors,
                population.year,
                population.citation,
                population.population_group,
                population.population,
                population.population_info,
                population.subject_count,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn insert_allele_frequency(
        &self,
        population_id: i64,
        frequency: &AlleleFrequency,
    ) -> ArtifactResult<()> {
        self.conn.execute(
            "INSERT INTO allele_frequency (population_id, allele_name, frequency)
             VALUES (?1, ?2, ?3)",
            params![population_id, frequency.allele_name, frequency.frequency],
        )?;
        Ok(())
    }

    /// Populations of one gene in insertion order, each with its frequencies
    pub fn populations(&self, gene: &str) -> ArtifactResult<Vec<PopulationFrequencies>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, authors, year, citation, population_group, name, info, subject_count
             FROM population WHERE gene_symbol = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![gene], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    PopulationFrequencies {
                        authors: row.get(1)?,
                        year: row.get(2)?,
                        citation: row.get(3)?,
                        population_group: row.get(4)?,
                        population: row.get(5)?,
                        population_info: row.get(6)?,
                        subject_count: row.get(7)?,
                        frequencies: Vec::new(),
                    },
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut freq_stmt = self.conn.prepare(
            "SELECT allele_name, frequency FROM allele_frequency
             WHERE population_id = ?1 ORDER BY rowid",
        )?;
        let mut populations = Vec::with_capacity(rows.len());
        for (id, mut population) in rows {
            population.frequencies = freq_stmt
                .query_map(params![id], |row| {
                    Ok(AlleleFrequency {
                        allele_name: row.get(0)?,
                        frequency: row.get(1)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            populations.push(population);
        }
        Ok(populations)
    }

    //==========================================================================
    // Notes and change log
    //==========================================================================

    pub fn insert_note(
        &self,
        entity_key: &str,
        file_type: FileType,
        ordinal: usize,
        note: &str,
    ) -> ArtifactResult<()> {
        self.conn.execute(
            "INSERT INTO file_note (entity_key, type, ordinal, note) VALUES (?1, ?2, ?3, ?4)",
            params![entity_key, file_type.as_str(), ordinal as i64, note],
        )?;
        Ok(())
    }

    pub fn notes(&self, entity_key: &str, file_type: FileType) -> ArtifactResult<Vec<String>> {
        self.strings(
            "SELECT note FROM file_note WHERE entity_key = ?1 AND type = ?2 ORDER BY ordinal, id",
            params![entity_key, file_type.as_str()],
        )
    }

    pub fn insert_history(
        &self,
        entity_key: &str,
        file_type: FileType,
        ordinal: usize,
        entry: &HistoryEntry,
    ) -> ArtifactResult<()> {
        self.conn.execute(
            "INSERT INTO change_log (entity_key, type, ordinal, date, note) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entity_key,
                file_type.as_str(),
                ordinal as i64,
                format_date(entry.date),
                entry.note
            ],
        )?;
        Ok(())
    }

    pub fn history(&self, entity_key: &str, file_type: FileType) -> ArtifactResult<Vec<HistoryEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT date, note FROM change_log WHERE entity_key = ?1 AND type = ?2 ORDER BY ordinal, id",
        )?;
        let rows = stmt
            .query_map(params![entity_key, file_type.as_str()], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(date, note)| Ok(HistoryEntry::new(parse_date(&date)?, note)))
            .collect()
    }

    //==========================================================================
    // Provenance
    //==========================================================================

    /// Append a file history record stamped with the current time
    pub fn record_file_history(&self, record: &ProvenanceRecord) -> ArtifactResult<()> {
        let keys = serde_json::to_string(&record.entity_keys)
            .map_err(|e| ArtifactError::Export(format!("Failed to encode entity keys: {}", e)))?;
        self.conn.execute(
            "INSERT INTO file_history (file_name, type, action, entity_keys, url, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.file_name,
                record.file_type.as_str(),
                record.action.as_str(),
                keys,
                record.url,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// All file history records, oldest first
    pub fn file_history(&self) -> ArtifactResult<Vec<ProvenanceRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT file_name, type, action, entity_keys, url FROM file_history ORDER BY id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(file_name, file_type, action, keys, url)| {
                let file_type = FileType::parse(&file_type).ok_or_else(|| {
                    ArtifactError::Export(format!("Unknown file type '{}' in file_history", file_type))
                })?;
                let action = match action.as_str() {
                    "import" => ProvenanceAction::Import,
                    "export" => ProvenanceAction::Export,
                    "upload" => ProvenanceAction::Upload,
                    other => {
                        return Err(ArtifactError::Export(format!(
                            "Unknown action '{}' in file_history",
                            other
                        )))
                    }
                };
                let entity_keys = serde_json::from_str(&keys).map_err(|e| {
                    ArtifactError::Export(format!("Bad entity keys in file_history: {}", e))
                })?;
                Ok(ProvenanceRecord {
                    file_name,
                    file_type,
                    action,
                    entity_keys,
                    url,
                })
            })
            .collect()
    }

    fn strings<P: rusqlite::Params>(&self, sql: &str, params: P) -> ArtifactResult<Vec<String>> {
        let mut stmt = self.conn.prepare(sql)?;
        let values = stmt
            .query_map(params, |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(values)
    }
}

struct RawFunctionRow {
    allele_name: String,
    activity_value: Option<String>,
    function_status: Option<String>,
    clinical_function_status: Option<String>,
    clinical_substrate: Option<String>,
    citations: String,
    strength: Option<String>,
    findings: Option<String>,
    comments: Option<String>,
}

impl RawFunctionRow {
    fn into_reference(self) -> ArtifactResult<FunctionReference> {
        let citations = serde_json::from_str(&self.citations)
            .map_err(|e| ArtifactError::Export(format!("Bad citations for {}: {}", self.allele_name, e)))?;
        Ok(FunctionReference {
            function_status: self.function_status.as_deref().map(FunctionStatus::from_label).transpose()?,
            clinical_function_status: self
                .clinical_function_status
                .as_deref()
                .map(FunctionStatus::from_label)
                .transpose()?,
            allele_name: self.allele_name,
            activity_value: self.activity_value,
            clinical_substrate: self.clinical_substrate,
            citations,
            strength: self.strength,
            findings: self.findings,
            comments: self.comments,
        })
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_date(value: &str) -> ArtifactResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| ArtifactError::Export(format!("Bad stored date '{}': {}", value, e)))
}
