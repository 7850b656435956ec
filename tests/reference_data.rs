// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Reference data loaded from a directory

use datalex::reference::{files, ReferenceData};
use std::fs;
use tempfile::TempDir;

const CSV_HEADER: &str = "COD_INE;ID_REL;COD_GEO;COD_PROV;PROVINCIA;NOMBRE_ACTUAL;POBLACION_MUNI;SUPERFICIE;PERIMETRO;COD_INE_CAPITAL;CAPITAL;POBLACION_CAPITAL;HOJA_MTN25_ETRS89;LONGITUD_ETRS89;LATITUD_ETRS89;ORIGENCOOR;ALTITUD;ORIGENALTITUD;DISCREPANTE_INE";

fn write_tables(dir: &TempDir) {
    let write = |name: &str, content: &str| fs::write(dir.path().join(name), content).unwrap();

    write(
        files::REGIONS,
        r#"[{ "autonomia_id": 1, "nombre": "Aragón" }, { "autonomia_id": 2, "nombre": "Cataluña" }]"#,
    );
    write(
        files::PROVINCES,
        r#"[
            { "provincia_id": 10, "nombre": "Huesca", "comunidad_id": 1 },
            { "provincia_id": 11, "nombre": "Zaragoza", "comunidad_id": 1 },
            { "provincia_id": 20, "nombre": "Girona", "comunidad_id": 2 }
        ]"#,
    );
    write(
        files::MUNICIPALITIES,
        r#"[
            { "municipio_id": 100, "nombre": "Jaca", "provincia_id": 10 },
            { "municipio_id": 110, "nombre": "Zaragoza", "provincia_id": 11 },
            { "municipio_id": 111, "nombre": "Calatayud", "provincia_id": 11 }
        ]"#,
    );
    write(
        files::MUNICIPALITY_POINTS,
        &format!(
            "{CSV_HEADER}\n\
             22130000000;1;221300;22;Huesca;Jaca;;;;;;;;-0,5494;42,5700;x;;x;No\n\
             50297000000;1;502970;50;Zaragoza;Zaragoza;;;;;;;;-0,8809;41,6521;x;;x;No\n\
             50067000000;1;500670;50;Zaragoza;Calatayud;;;;;;;;-1,6430;41,3530;x;;x;No\n"
        ),
    );
    write(
        files::AMBITO,
        r#"[{ "id": "MUN", "descripcion": "Municipal" }]"#,
    );
    write(
        files::SCALES,
        r#"[{ "id": "PLAN_URB", "descripcion": "Plan Urbanístico" }]"#,
    );
    write(
        files::THESAURUS,
        r#"[
            { "id": "AMB-04", "descripcion": "Ciclo del agua", "categoria_padre": "Sostenibilidad Ambiental" },
            { "id": "GOB-01", "descripcion": "Participación ciudadana" }
        ]"#,
    );
}

#[test]
fn test_hierarchy_is_resolved_by_parent_id() {
    let dir = TempDir::new().unwrap();
    write_tables(&dir);
    let data = ReferenceData::from_dir(dir.path());

    let aragon = data.region_named("aragón").unwrap().unwrap();
    let provinces: Vec<_> = data
        .provinces_of(&aragon.id)
        .unwrap()
        .into_iter()
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(provinces, ["Huesca", "Zaragoza"]);

    let towns: Vec<_> = data
        .municipalities_of("11")
        .unwrap()
        .into_iter()
        .map(|m| m.name.as_str())
        .collect();
    assert_eq!(towns, ["Zaragoza", "Calatayud"]);
}

#[test]
fn test_names_match_regardless_of_accented_case() {
    let dir = TempDir::new().unwrap();
    write_tables(&dir);
    let data = ReferenceData::from_dir(dir.path());

    assert_eq!(data.region_named("ARAGÓN").unwrap().unwrap().id, "1");
    assert_eq!(data.region_named(" cataluña ").unwrap().unwrap().id, "2");
    assert_eq!(data.province_named("GIRONA").unwrap().unwrap().region_id, "2");
    assert!(data.region_named("Galicia").unwrap().is_none());
}

#[test]
fn test_ready_only_after_every_table_loaded() {
    let dir = TempDir::new().unwrap();
    write_tables(&dir);
    let data = ReferenceData::from_dir(dir.path());

    data.regions().unwrap();
    assert!(!data.is_ready());
    data.preload().unwrap();
    assert!(data.is_ready());
}

#[test]
fn test_tables_are_read_once() {
    let dir = TempDir::new().unwrap();
    write_tables(&dir);
    let data = ReferenceData::from_dir(dir.path());

    assert_eq!(data.scale_description("PLAN_URB"), "Plan Urbanístico");
    fs::remove_file(dir.path().join(files::SCALES)).unwrap();
    assert_eq!(data.scale_description("PLAN_URB"), "Plan Urbanístico");
}

#[test]
fn test_thesaurus_labels_and_missing_parent_category() {
    let dir = TempDir::new().unwrap();
    write_tables(&dir);
    let data = ReferenceData::from_dir(dir.path());

    let labels = data.describe_codes("AMB-04;GOB-01;XYZ");
    let described: Vec<_> = labels.iter().map(|l| l.description.as_str()).collect();
    assert_eq!(described, ["Ciclo del agua", "Participación ciudadana", "XYZ"]);
    assert_eq!(data.thesaurus().unwrap()[1].parent_category, "");
}

#[test]
fn test_municipality_point_prefers_exact_match() {
    let dir = TempDir::new().unwrap();
    write_tables(&dir);
    let data = ReferenceData::from_dir(dir.path());

    let exact = data.municipality_point(" zaragoza ").unwrap();
    assert_eq!(exact.name, "Zaragoza");
    assert!((exact.lat - 41.6521).abs() < 1e-9);

    let partial = data.municipality_point("Calatayud de Aragón").unwrap();
    assert_eq!(partial.name, "Calatayud");

    assert!(data.municipality_point("").is_none());
}

#[test]
fn test_malformed_table_is_an_error_not_a_panic() {
    let dir = TempDir::new().unwrap();
    write_tables(&dir);
    fs::write(dir.path().join(files::AMBITO), "{ not json").unwrap();
    let data = ReferenceData::from_dir(dir.path());

    let err = data.ambito_table().unwrap_err();
    assert!(err.to_string().contains(files::AMBITO));
    assert_eq!(data.ambito_description("MUN"), "MUN");
}
