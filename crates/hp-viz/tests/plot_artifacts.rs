use approx::assert_abs_diff_eq;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use hp_core::Error;
use hp_viz::{
    CorrMatrixPlot, ErrorDisplay, Hist1DOptions, Hist1DPlot, LoadPolicy, OverlaySelection,
    PlotConfiguration, ProjectionPlot, PullPlot, RatioPlot, Reference, SampleStore,
};
use serde_json::json;

fn tmp_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    let mut p = std::env::temp_dir();
    p.push(format!("hepplot_viz_{}_{}_{}", std::process::id(), nanos, name));
    std::fs::create_dir_all(&p).unwrap();
    p
}

fn write(dir: &Path, file: &str, value: serde_json::Value) -> PathBuf {
    let path = dir.join(file);
    std::fs::write(&path, serde_json::to_vec(&value).unwrap()).unwrap();
    path
}

fn hist1d(label: &str, values: &[f64]) -> serde_json::Value {
    json!({
        "axes": [{ "name": "mjj", "label": label, "edges": [0.0, 50.0, 100.0, 150.0] }],
        "values": values,
    })
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_slice(&std::fs::read(path).unwrap())
        .unwrap_or_else(|e| panic!("invalid JSON at {}: {}", path.display(), e))
}

fn sample_dir(name: &str) -> PathBuf {
    let dir = tmp_dir(name);
    write(&dir, "ttbar.json", hist1d("t#bar{t}", &[10.0, 20.0, 5.0]));
    write(&dir, "wjets.json", hist1d("W+jets", &[6.0, 5.0, 0.0]));
    write(&dir, "data.json", hist1d("Data", &[18.0, 24.0, 4.0]));
    dir
}

#[test]
fn stack_with_data_ratio_against_total() {
    let dir = sample_dir("ratio_total");
    let store = SampleStore::load(
        &dir,
        &["ttbar", "wjets", "data"],
        &OverlaySelection::from_names(&["data"]),
        LoadPolicy::FailFast,
    )
    .unwrap();
    assert_eq!(store.histograms().len(), 2);
    assert_eq!(store.overlays().len(), 1);

    let opts = Hist1DOptions { stack: true, errors: ErrorDisplay::Data, ..Default::default() };
    let mut plot = RatioPlot::new(store, Reference::Total, opts).unwrap();
    plot.ratio_options([0.5, 1.5], Some(0.5), false).unwrap();

    assert_eq!(plot.denominator(), &[16.0, 25.0, 5.0]);
    let (name, r) = &plot.ratios()[0];
    assert_eq!(name, "data");
    assert_abs_diff_eq!(r[0], 1.125);
    assert_abs_diff_eq!(r[1], 0.96);
    assert_abs_diff_eq!(r[2], 0.8);

    let out = dir.join("ratio.json");
    hp_viz::write_artifact(&out, &plot.artifact().unwrap()).unwrap();
    let v = read_json(&out);
    assert_eq!(v["schema_version"], "hepplot_ratio_v0");
    assert_eq!(v["reference"], "total");
    assert_eq!(v["meta"]["tool"], "hepplot");
    assert_eq!(v["main"]["stack_total"], json!([16.0, 25.0, 5.0]));
    assert_eq!(v["main"]["overlays"][0]["label"], "Data");
    assert_eq!(v["y_axis"]["labels"], json!(["", "1", ""]));
    assert_eq!(v["y_title"], "Ratio against \ntotal");
    assert!(v["ratio_bands"].as_array().unwrap().is_empty());
}

#[test]
fn fail_fast_and_collect_partial() {
    let dir = sample_dir("partial");
    write(&dir, "broken.json", json!({ "yields": [1, 2, 3] }));
    let names = ["ttbar", "broken", "missing", "wjets"];

    let err = SampleStore::load(&dir, &names, &OverlaySelection::None, LoadPolicy::FailFast);
    assert!(matches!(err, Err(Error::Validation(_))), "got {err:?}");

    let store =
        SampleStore::load(&dir, &names, &OverlaySelection::None, LoadPolicy::CollectPartial).unwrap();
    assert_eq!(store.names(), vec!["ttbar", "wjets"]);
    let failures = store.failures();
    assert_eq!(failures.len(), 2);
    assert_eq!(failures[0].sample, "broken");
    assert!(matches!(failures[0].error, Error::Validation(_)));
    assert!(matches!(failures[1].error, Error::Io(_)));
}

#[test]
fn mismatched_binning_fails_load() {
    let dir = sample_dir("binning");
    write(
        &dir,
        "zjets.json",
        json!({ "axes": [{ "edges": [0.0, 75.0, 150.0] }], "values": [1.0, 2.0] }),
    );
    let err = SampleStore::load(&dir, &["ttbar", "zjets"], &OverlaySelection::None, LoadPolicy::FailFast);
    assert!(matches!(err, Err(Error::Validation(_))));
}

#[test]
fn two_dimensional_file_is_not_a_sample() {
    let dir = tmp_dir("two_d");
    write(
        &dir,
        "h2.json",
        json!({
            "axes": [{ "edges": [0.0, 1.0] }, { "edges": [0.0, 1.0, 2.0] }],
            "values": [1.0, 2.0],
        }),
    );
    let err = SampleStore::load(&dir, &["h2"], &OverlaySelection::None, LoadPolicy::FailFast);
    assert!(matches!(err, Err(Error::Validation(_))));

    let h = hp_viz::input::read_histogram2d(&dir.join("h2.json")).unwrap();
    let art = ProjectionPlot::new(h, PlotConfiguration::default()).unwrap().artifact().unwrap();
    assert_eq!(art.x_projection.y, vec![3.0]);
    assert_eq!(art.y_projection.y, vec![1.0, 2.0]);
}

#[test]
fn hist1d_overlay_artifact_from_disk() {
    let dir = sample_dir("hist1d");
    let store =
        SampleStore::load(&dir, &["ttbar", "wjets"], &OverlaySelection::None, LoadPolicy::FailFast)
            .unwrap();
    let opts = Hist1DOptions { errors: ErrorDisplay::Hist, ..Default::default() };
    let mut plot = Hist1DPlot::new(store, opts).unwrap();
    plot.set_axis_labels(None, [("xmain", "m_jj [GeV]"), ("ymain", "Events")]).unwrap();
    plot.fontsize_options(Some(18.0), None, Some(9.0)).unwrap();
    plot.figure_options([("title", json!("Signal region"))]).unwrap();
    assert!(plot.figure_options([("dpi", json!(300))]).is_err());

    let v = serde_json::to_value(plot.artifact().unwrap()).unwrap();
    assert_eq!(v["schema_version"], "hepplot_hist1d_v0");
    assert_eq!(v["config"]["titles"]["xmain"], "m_jj [GeV]");
    assert_eq!(v["config"]["fonts"]["title"], json!(18.0));
    assert_eq!(v["config"]["params"]["font.size"], json!(9.0));
    assert_eq!(v["config"]["figure"]["title"], "Signal region");
    assert_eq!(v["histograms"][0]["color"], "#000000");
    assert_eq!(v["histograms"][1]["color"], "#ff0000");
    assert_eq!(v["error_bands"].as_array().unwrap().len(), 2);
    assert_eq!(v["x_ticks"][10], json!(150.0));
    assert_eq!(v["config"]["shape"], "hollow");
}

#[test]
fn pull_and_corr_from_disk() {
    let dir = tmp_dir("pull_corr");
    let pulls = write(
        &dir,
        "pulls.json",
        json!({ "entries": [
            { "label": "mu", "value": 1.0, "pos_err": 0.4, "neg_err": -0.3 },
            { "label": "jes", "value": 0.2, "pos_err": 1.1, "neg_err": -0.9 },
        ]}),
    );
    let table = hp_viz::input::read_pull_table(&pulls).unwrap();
    let art = PullPlot::new(table, PlotConfiguration::default()).unwrap().artifact().unwrap();
    assert_eq!(art.center, 1.0);
    // ceil(1.1) + 2 = 4 around 1.
    assert_eq!((art.x_axis.min, art.x_axis.max), (-3.0, 5.0));
    assert_eq!(art.x_axis.labels[0], "-3");

    let corr = write(
        &dir,
        "corr.json",
        json!({ "names": ["mu", "a", "b"], "matrix": [[1.0, 0.02, -0.4], [0.02, 1.0, 0.1], [-0.4, 0.1, 1.0]] }),
    );
    let table = hp_viz::input::read_correlation_table(&corr).unwrap();
    let plot = CorrMatrixPlot::new(table, 0.05, PlotConfiguration::default()).unwrap();
    assert_eq!(plot.names(), &["mu", "b"]);
    assert_abs_diff_eq!(plot.matrix()[1][0], -40.0, epsilon = 1e-9);

    let bad = write(&dir, "bad_corr.json", json!({ "names": ["a", "b"], "matrix": [[1.0]] }));
    assert!(matches!(hp_viz::input::read_correlation_table(&bad), Err(Error::Validation(_))));
}

#[test]
fn yaml_config_flows_into_artifact() {
    let cfg = hp_viz::resolve_config(Some("style: cms\ngrid: \"x--\"\n")).unwrap();
    let dir = sample_dir("yaml");
    let store =
        SampleStore::load(&dir, &["ttbar"], &OverlaySelection::None, LoadPolicy::FailFast).unwrap();
    let plot = Hist1DPlot::new(store, Hist1DOptions { config: cfg, ..Default::default() }).unwrap();
    let v = serde_json::to_value(plot.artifact().unwrap()).unwrap();
    assert_eq!(v["config"]["style"], "cms");
    assert_eq!(v["config"]["grid"], "x--");
    assert_eq!(v["config"]["figure"]["logo_text"], "Preliminary");
}
