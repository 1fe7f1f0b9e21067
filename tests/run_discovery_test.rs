use camino::{Utf8Path, Utf8PathBuf};

use skysim::catalog::table_file;
use skysim::runs::{find_sim_file, RunCatalog, RunEntry};
use skysim::{Column, ColumnTable, SIM_ID_V1};

fn utf8(dir: &tempfile::TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
}

fn write_tractor(base: &Utf8Path, brickname: &str, sim_id: &[(&str, i64)]) {
    let path = find_sim_file(&SIM_ID_V1, base, "tractor", brickname, sim_id, None).unwrap();
    let mut table = ColumnTable::new();
    table.set("ra", Column::Float(vec![10.5])).unwrap();
    table.set("dec", Column::Float(vec![20.5])).unwrap();
    table_file::write_table(&table, &path).unwrap();
}

#[test]
fn discovery_enumerates_existing_runs() {
    let dir = tempfile::tempdir().unwrap();
    let base = utf8(&dir);

    write_tractor(&base, "2599p187", &[]);
    write_tractor(&base, "2599p187", &[("fileid", 1), ("rowstart", 2), ("skipid", 3)]);
    write_tractor(&base, "0001m002", &[("fileid", 1), ("rowstart", 2), ("skipid", 3)]);
    // Directories that do not conform to the sim-id template are ignored.
    std::fs::create_dir_all(base.join("merged").as_std_path()).unwrap();

    let runcat = RunCatalog::from_output_directory(&SIM_ID_V1, &base, None, &[]).unwrap();
    assert_eq!(runcat.len(), 3);

    let mut expected = RunCatalog::new(&SIM_ID_V1);
    expected
        .push(RunEntry {
            brickname: "2599p187".to_string(),
            sim_id: vec![0, 0, 0],
        })
        .unwrap();
    expected
        .push(RunEntry {
            brickname: "2599p187".to_string(),
            sim_id: vec![1, 2, 3],
        })
        .unwrap();
    expected
        .push(RunEntry {
            brickname: "0001m002".to_string(),
            sim_id: vec![1, 2, 3],
        })
        .unwrap();
    assert_eq!(runcat, expected);
}

#[test]
fn discovery_respects_pinned_keys_and_brick_list() {
    let dir = tempfile::tempdir().unwrap();
    let base = utf8(&dir);

    write_tractor(&base, "2599p187", &[]);
    write_tractor(&base, "2599p187", &[("skipid", 5)]);
    write_tractor(&base, "0001m002", &[("skipid", 5)]);

    let pinned =
        RunCatalog::from_output_directory(&SIM_ID_V1, &base, None, &[("skipid", 5)])
            .unwrap();
    assert_eq!(pinned.len(), 2);
    assert!(pinned.iter().all(|e| e.sim_id[2] == 5));

    let bricks = vec!["2599p187".to_string(), "9999p999".to_string()];
    let listed =
        RunCatalog::from_output_directory(&SIM_ID_V1, &base, Some(&bricks), &[]).unwrap();
    // Only bricks whose outputs actually exist are emitted.
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|e| e.brickname == "2599p187"));
}

#[test]
fn discovered_catalog_round_trips_through_run_list() {
    let dir = tempfile::tempdir().unwrap();
    let base = utf8(&dir);

    write_tractor(&base, "2599p187", &[("fileid", 3)]);
    write_tractor(&base, "0001m002", &[]);

    let runcat = RunCatalog::from_output_directory(&SIM_ID_V1, &base, None, &[]).unwrap();
    assert_eq!(runcat.len(), 2);

    let list_path = base.join("runlist.txt");
    runcat.write_list(&list_path).unwrap();
    let back = RunCatalog::from_list(&SIM_ID_V1, &list_path).unwrap();
    assert_eq!(back, runcat);
}

#[test]
fn empty_output_tree_discovers_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let base = utf8(&dir);
    let runcat = RunCatalog::from_output_directory(&SIM_ID_V1, &base, None, &[]).unwrap();
    assert!(runcat.is_empty());
}
