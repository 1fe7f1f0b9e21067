use camino::Utf8Path;

use skysim::runs::{find_file, find_pipeline_file, find_sim_file, Source};
use skysim::skysim_errors::SkysimError;
use skysim::SIM_ID_V1;

const SIM_ID: &[(&str, i64)] = &[("fileid", 1), ("rowstart", 2), ("skipid", 3)];

#[test]
fn pipeline_and_generic_resolution_agree() {
    let direct =
        find_pipeline_file(Utf8Path::new("tests"), "tractor", "2599p187", None).unwrap();
    let generic = find_file(
        &SIM_ID_V1,
        Utf8Path::new("tests"),
        "tractor",
        "2599p187",
        Source::Pipeline,
        &[],
        None,
    )
    .unwrap();
    assert_eq!(direct, generic);
    assert_eq!(direct, "tests/tractor/259/tractor-2599p187.csv");
}

#[test]
fn sim_outputs_are_sharded_by_sim_id() {
    let tractor = find_sim_file(
        &SIM_ID_V1,
        Utf8Path::new("tests"),
        "tractor",
        "2599p187",
        SIM_ID,
        None,
    )
    .unwrap();
    // The sim path nests the pipeline-relative path under the encoded id.
    let pipeline =
        find_pipeline_file(Utf8Path::new(""), "tractor", "2599p187", None).unwrap();
    assert_eq!(tractor, Utf8Path::new("tests/file1_rs2_skip3").join(pipeline));

    let injected = find_sim_file(
        &SIM_ID_V1,
        Utf8Path::new("tests"),
        "injected",
        "2599p187",
        SIM_ID,
        None,
    )
    .unwrap();
    assert_eq!(injected, "tests/file1_rs2_skip3/sim/259/injected-2599p187.csv");
}

#[test]
fn staged_and_auxiliary_filetypes() {
    let base = Utf8Path::new(".");
    let pickle = find_sim_file(
        &SIM_ID_V1,
        base,
        "pickle",
        "2599p187",
        SIM_ID,
        Some("fitblobs"),
    )
    .unwrap();
    assert_eq!(
        pickle,
        "./file1_rs2_skip3/pickles/259/runbrick-2599p187-fitblobs.bin"
    );

    let checkpoint =
        find_sim_file(&SIM_ID_V1, base, "checkpoint", "2599p187", SIM_ID, None).unwrap();
    assert_eq!(
        checkpoint,
        "./file1_rs2_skip3/checkpoints/259/checkpoint-2599p187.bin"
    );

    let log = find_sim_file(&SIM_ID_V1, base, "log", "2599p187", SIM_ID, None).unwrap();
    assert_eq!(log, "./file1_rs2_skip3/logs/259/log-2599p187.log");

    let ps = find_sim_file(&SIM_ID_V1, base, "ps", "2599p187", SIM_ID, None).unwrap();
    assert_eq!(ps, "./file1_rs2_skip3/metrics/259/ps-2599p187.csv");
}

#[test]
fn bricks_filetype_ignores_sharding() {
    let path = find_file(
        &SIM_ID_V1,
        Utf8Path::new("tests"),
        "bricks",
        "2599p187",
        Source::Sim,
        SIM_ID,
        None,
    )
    .unwrap();
    assert_eq!(path, "tests/survey-bricks.csv");
}

#[test]
fn sim_id_errors_propagate_through_resolution() {
    let err = find_sim_file(
        &SIM_ID_V1,
        Utf8Path::new("tests"),
        "tractor",
        "2599p187",
        &[("zoom", 1)],
        None,
    )
    .unwrap_err();
    assert_eq!(err, SkysimError::UnknownKey("zoom".to_string()));
}
