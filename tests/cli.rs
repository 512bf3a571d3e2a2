use std::fs;
use std::path::Path;

use tempfile::tempdir;

use oceansense::apps::run_oceansense_to;

fn write_fixture(root: &Path) -> std::path::PathBuf {
    fs::write(
        root.join("obis.csv"),
        "scientificName,decimalLatitude,decimalLongitude,eventDate\n\
         Rastrelliger kanagurta,9.9,76.3,2001-06-01\n\
         Thunnus albacares,,,2002-01-10\n\
         Thunnus albacares,10.5,75.2,2002-02-11\n",
    )
    .unwrap();
    fs::write(root.join("monsoon.csv"), "Year,D,TOTAL\n2001,2,3\n2002,1,1\n").unwrap();
    fs::write(
        root.join("species.json"),
        r#"[{"scientificName": "Thunnus albacares", "category": "Pelagic"},
            {"scientificName": "Rastrelliger kanagurta", "category": "Pelagic"}]"#,
    )
    .unwrap();
    let manifest = root.join("manifest.json");
    fs::write(
        &manifest,
        r#"{
            "registry": "species.json",
            "sources": [
                {"id": "obis", "kind": "fisheries", "path": "obis.csv"},
                {"id": "monsoon", "kind": "cyclone-track-point", "path": "monsoon.csv",
                 "fields": {"season": "Monsoon"}},
                {"id": "ocean", "kind": "ocean-parameter", "path": "missing.json"}
            ],
            "config": {"top_labels": 1}
        }"#,
    )
    .unwrap();
    manifest
}

fn run(args: &[&str]) -> String {
    let mut out = Vec::new();
    run_oceansense_to(args.iter().map(|arg| arg.to_string()), &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn export_writes_filtered_records_and_summary() {
    let temp = tempdir().unwrap();
    let manifest = write_fixture(temp.path());
    let manifest = manifest.to_str().unwrap();

    let text = run(&[
        "--manifest",
        manifest,
        "--species",
        "Thunnus albacares",
        "--year-min",
        "1900",
        "--year-max",
        "2021",
        "export",
    ]);
    assert_eq!(
        text,
        "label,latitude,longitude,year,sourceKind\n\
         Thunnus albacares,,,2002,fisheries\n\
         Thunnus albacares,10.5,75.2,2002,fisheries\n\
         Monsoon,,,2001,cyclone-track-point\n\
         Monsoon,,,2002,cyclone-track-point\n\
         \n\
         filter,value\n\
         species,Thunnus albacares\n\
         category,All\n\
         season,All\n\
         yearMin,1900\n\
         yearMax,2021\n"
    );
}

#[test]
fn export_to_file_and_correlate_output() {
    let temp = tempdir().unwrap();
    let manifest = write_fixture(temp.path());
    let manifest = manifest.to_str().unwrap();
    let output = temp.path().join("out.csv");

    let printed = run(&[
        "--manifest",
        manifest,
        "--season",
        "monsoon",
        "export",
        "--output",
        output.to_str().unwrap(),
    ]);
    assert!(printed.is_empty());
    let written = fs::read_to_string(&output).unwrap();
    assert!(written.contains("season,monsoon\nyearMin,2001\nyearMax,2002\n"));

    let correlate = run(&["--manifest", manifest, "correlate"]);
    assert_eq!(
        correlate,
        "year,cyclones,fisheries\n2001,3,1\n2002,1,2\nsamples: 2, pearson r: -1.0000\n"
    );
}

#[test]
fn json_summary_and_clusters() {
    let temp = tempdir().unwrap();
    let manifest = write_fixture(temp.path());
    let manifest = manifest.to_str().unwrap();

    let summary: serde_json::Value =
        serde_json::from_str(&run(&["--manifest", manifest, "--json", "summary"])).unwrap();
    assert_eq!(summary["filter"]["species"], "All");
    assert_eq!(summary["fisheries"]["record_count"], 3);
    assert_eq!(summary["fisheries"]["top_species"][0][0], "Thunnus albacares");
    assert_eq!(summary["fisheries"]["categories"][0], "Pelagic");
    assert_eq!(summary["storms"]["seasons"][0], "Monsoon");

    let text = run(&["--manifest", manifest, "summary"]);
    assert!(text.contains("ocean (ocean-parameter) => unavailable:"));
    assert!(text.contains("obis (fisheries) => records: 3, dropped: 0, malformed: 0"));

    let clusters = run(&["--manifest", manifest, "clusters", "--precision", "0"]);
    assert_eq!(
        clusters,
        "latitude,longitude,count,labels\n10,76,1,Rastrelliger kanagurta\n11,75,1,Thunnus albacares\n"
    );
}

#[test]
fn invalid_manifest_is_reported() {
    let temp = tempdir().unwrap();
    let manifest = temp.path().join("manifest.json");
    fs::write(&manifest, r#"{"sources": []}"#).unwrap();
    let mut out = Vec::new();
    let err = run_oceansense_to(
        ["--manifest", manifest.to_str().unwrap(), "summary"]
            .iter()
            .map(|arg| arg.to_string()),
        &mut out,
    )
    .unwrap_err();
    assert!(err.to_string().contains("manifest declares no sources"));
}
