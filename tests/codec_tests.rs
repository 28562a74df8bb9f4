//! Allele definition matrix codec through real .xlsx bytes

use pgx_artifacts::codec::{decode, encode_definitions, AlleleDefinitionEncoder, ALLELE_SHEET_NAME};
use pgx_artifacts::excel::{ExcelExporter, ExcelImporter};
use pgx_artifacts::ordering::compare_haplotype_names;
use pgx_artifacts::types::{
    AlleleDefinition, FunctionStatus, GeneAlleleDefinitions, GeneHeader, HistoryEntry, Location,
    LocationValue,
};
use pgx_artifacts::workbook::sidecar;
use pgx_artifacts::{ArtifactError, Workbook};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

fn location(id: i64, name: &str, rsid: &str) -> Location {
    Location {
        id,
        name: name.to_string(),
        protein_location: Some(format!("p.{}", id)),
        chromosome_location: Some(format!("g.{}000A>G", id)),
        gene_location: None,
        dbsnp_id: Some(rsid.to_string()),
    }
}

fn value(location_id: i64, allele: &str) -> LocationValue {
    LocationValue {
        location_id,
        variant_allele: allele.to_string(),
    }
}

fn cyp2c19() -> GeneAlleleDefinitions {
    GeneAlleleDefinitions {
        gene: GeneHeader {
            symbol: "CYP2C19".to_string(),
            alleles_last_modified: NaiveDate::from_ymd_opt(2022, 11, 3),
            chromo_sequence_id: Some("NC_000010.11".to_string()),
            protein_sequence_id: Some("NP_000760.1".to_string()),
            gene_sequence_id: Some("NG_008384.3".to_string()),
            mrna_sequence_id: Some("NM_000769.4".to_string()),
        },
        // ids deliberately out of order: discovery order fixes the columns
        locations: vec![
            location(42, "c.681G>A", "rs4244285"),
            location(7, "c.636G>A", "rs4986893"),
            location(19, "c.-806C>T", "rs12248560"),
        ],
        alleles: vec![
            AlleleDefinition {
                name: "*17".to_string(),
                function_status: Some(FunctionStatus::Increased),
                values: vec![value(19, "T")],
            },
            AlleleDefinition {
                name: "*2".to_string(),
                function_status: Some(FunctionStatus::No),
                values: vec![value(42, " A ")],
            },
            AlleleDefinition {
                name: "*1".to_string(),
                function_status: Some(FunctionStatus::Normal),
                values: vec![value(42, "G"), value(7, "G"), value(19, "C")],
            },
            AlleleDefinition {
                name: "*3".to_string(),
                function_status: Some(FunctionStatus::No),
                values: vec![value(7, "A")],
            },
        ],
        notes: vec!["Positions are on the + strand".to_string()],
        history: vec![HistoryEntry::new(
            NaiveDate::from_ymd_opt(2021, 1, 15).unwrap(),
            "Added *17",
        )],
    }
}

fn through_xlsx(workbook: &Workbook) -> Workbook {
    let bytes = ExcelExporter::new(workbook).to_buffer().unwrap();
    ExcelImporter::from_bytes(workbook.name(), bytes).unwrap()
}

/// (allele, location name, trimmed value) for the source model
fn source_triples(defs: &GeneAlleleDefinitions) -> BTreeSet<(String, String, String)> {
    let names: HashMap<i64, &str> = defs.locations.iter().map(|l| (l.id, l.name.as_str())).collect();
    defs.alleles
        .iter()
        .flat_map(|a| {
            let names = &names;
            a.values.iter().map(move |v| {
                (
                    a.name.clone(),
                    names[&v.location_id].to_string(),
                    v.variant_allele.trim().to_string(),
                )
            })
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════
// ROUND TRIP
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_round_trip_preserves_triples() {
    let defs = cyp2c19();
    let workbook = through_xlsx(&encode_definitions(&defs).unwrap());
    let decoded = decode(workbook.sheet(ALLELE_SHEET_NAME).unwrap()).unwrap();

    let columns: HashMap<usize, String> = decoded
        .locations
        .iter()
        .map(|l| (l.column, l.name.clone()))
        .collect();
    let triples: BTreeSet<(String, String, String)> = decoded
        .triples()
        .into_iter()
        .map(|(allele, col, value)| (allele, columns[&col].clone(), value))
        .collect();

    assert_eq!(triples, source_triples(&defs));
}

#[test]
fn test_round_trip_preserves_gene_header_and_labels() {
    let defs = cyp2c19();
    let workbook = through_xlsx(&encode_definitions(&defs).unwrap());
    let decoded = decode(workbook.sheet(ALLELE_SHEET_NAME).unwrap()).unwrap();

    assert_eq!(decoded.gene, defs.gene);
    let first = &decoded.locations[0];
    assert_eq!(first.name, "c.681G>A");
    assert_eq!(first.protein_location.as_deref(), Some("p.42"));
    assert_eq!(first.dbsnp_id.as_deref(), Some("rs4244285"));
    assert_eq!(first.gene_location, None);
}

#[test]
fn test_round_trip_sidecars() {
    let defs = cyp2c19();
    let workbook = through_xlsx(&encode_definitions(&defs).unwrap());

    assert_eq!(sidecar::read_notes(&workbook), defs.notes);
    assert_eq!(sidecar::read_history(&workbook).unwrap(), defs.history);
}

#[test]
fn test_rows_are_in_haplotype_order() {
    let workbook = through_xlsx(&encode_definitions(&cyp2c19()).unwrap());
    let decoded = decode(workbook.sheet(ALLELE_SHEET_NAME).unwrap()).unwrap();
    let names: Vec<&str> = decoded.alleles.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["*1", "*2", "*3", "*17"]);
}

// ═══════════════════════════════════════════════════════════════════════════
// ENCODER CONTRACT
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_encode_is_deterministic() {
    let defs = cyp2c19();
    let first = encode_definitions(&defs).unwrap();
    let second = encode_definitions(&defs).unwrap();
    assert_eq!(first, second);

    let columns = |wb: &Workbook| -> Vec<(usize, String)> {
        decode(wb.sheet(ALLELE_SHEET_NAME).unwrap())
            .unwrap()
            .locations
            .into_iter()
            .map(|l| (l.column, l.name))
            .collect()
    };
    assert_eq!(
        columns(&first),
        vec![
            (2, "c.681G>A".to_string()),
            (3, "c.636G>A".to_string()),
            (4, "c.-806C>T".to_string()),
        ]
    );
}

#[test]
fn test_encode_rejects_unregistered_location() {
    let mut defs = cyp2c19();
    defs.alleles[0].values.push(value(999, "T"));
    let err = encode_definitions(&defs).unwrap_err();
    assert!(matches!(err, ArtifactError::UnknownLocation(id) if id == "999"));
}

#[test]
fn test_encode_rejects_duplicate_location() {
    let mut defs = cyp2c19();
    defs.locations.push(location(7, "c.636G>A", "rs4986893"));
    assert!(matches!(
        encode_definitions(&defs).unwrap_err(),
        ArtifactError::DuplicateLocation(_)
    ));
}

#[test]
fn test_encode_rejects_repeated_location_name() {
    let mut defs = cyp2c19();
    defs.locations.push(location(8, "c.636G>A", "rs0"));
    let err = encode_definitions(&defs).unwrap_err();
    assert!(matches!(err, ArtifactError::DuplicateLocation(name) if name == "c.636G>A"));
}

#[test]
fn test_encode_rejects_blank_allele_name() {
    let mut defs = cyp2c19();
    defs.alleles[1].name = "  ".to_string();
    assert!(matches!(
        encode_definitions(&defs).unwrap_err(),
        ArtifactError::Export(_)
    ));
}

#[test]
fn test_encoder_reuses_column_for_known_location() {
    let mut encoder = AlleleDefinitionEncoder::new(&GeneHeader::new("CYP2C19")).unwrap();
    let col = encoder.write_location(&location(42, "c.681G>A", "rs4244285")).unwrap();
    encoder.write_allele("*2", None).unwrap();
    encoder.write_value(42, "A").unwrap();
    encoder.write_allele("*1", None).unwrap();
    encoder.write_value(42, "G").unwrap();
    assert_eq!(encoder.column_of(42), Some(col));

    let sheet = encoder.finish();
    assert_eq!(sheet.width(), col + 1);
}

#[test]
fn test_no_notes_sheet_without_notes() {
    let mut defs = cyp2c19();
    defs.notes.clear();
    let workbook = through_xlsx(&encode_definitions(&defs).unwrap());
    assert!(workbook.sheet(sidecar::NOTES_SHEET_NAME).is_none());
}

// ═══════════════════════════════════════════════════════════════════════════
// DECODE FAILURES
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_one_sided_history_row_after_round_trip() {
    let mut broken = Workbook::new("broken.xlsx");
    let sheet = broken.create_sheet(sidecar::HISTORY_SHEET_NAME);
    sheet.next_row().set_text(0, Some("Date"));
    sheet.next_row().set_text(1, Some("note with no date"));

    let err = sidecar::read_history(&through_xlsx(&broken)).unwrap_err();
    assert!(matches!(err, ArtifactError::MalformedRow { row: 2, .. }));
}

// ═══════════════════════════════════════════════════════════════════════════
// ORDERING
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_numeral_magnitude_beats_string_length() {
    for (m, n) in [(1, 2), (9, 10), (2, 100), (99, 101), (9, 1000)] {
        let a = format!("*{}", m);
        let b = format!("*{}", n);
        assert_eq!(compare_haplotype_names(&a, &b), Ordering::Less, "{} vs {}", a, b);
        let a = format!("*{}A", m);
        let b = format!("*{}A", n);
        assert_eq!(compare_haplotype_names(&a, &b), Ordering::Less, "{} vs {}", a, b);
    }
}

#[test]
fn test_ordering_is_total() {
    let names = ["*1", "*1A", "*1B", "*01", "*10", "*2", "*1x2", "Reference"];
    for a in names {
        for b in names {
            let ord = compare_haplotype_names(a, b);
            assert_eq!(ord == Ordering::Equal, a == b, "{} vs {}", a, b);
            assert_eq!(ord.reverse(), compare_haplotype_names(b, a));
        }
    }
}
