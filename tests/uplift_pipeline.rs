use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uplift_roi::constants::{MENS_EMAIL, NO_EMAIL, OUTCOME_COL, TREATMENT_COL, WOMENS_EMAIL};
use uplift_roi::{
    default_features, prepare_treatment, qini_auc, qini_curve, run_ab_tests, run_uplift_and_roi, simulate_roi,
    train_uplift_tlearner, uplift_at_k, ConfigIO, Dataset, FeatureSpec, RoiConfig, UpliftConfig, UpliftError,
};

// A Hillstrom shaped CSV: e-mails lift conversion for recent customers only.
fn campaign_csv(n: usize, seed: u64) -> String {
    let mut rng = StdRng::seed_from_u64(seed);
    let segments = [MENS_EMAIL, WOMENS_EMAIL, NO_EMAIL];
    let mut csv = String::from("Recency,History,Mens,Zip_Code,Channel,Segment,Visit,Conversion,Spend\n");
    for i in 0..n {
        let segment = segments[i % 3];
        let recency = rng.gen_range(1..=12);
        let history: f64 = rng.gen_range(30.0..3000.0);
        let mens = rng.gen_range(0..=1);
        let zip = ["Urban", "Surburban", "Rural"][rng.gen_range(0..3)];
        let channel = ["Web", "Phone", "Multichannel"][rng.gen_range(0..3)];
        let p = match (segment, recency) {
            (NO_EMAIL, _) => 0.04,
            (_, r) if r <= 4 => 0.30,
            _ => 0.05,
        };
        let conversion = u8::from(rng.gen::<f64>() < p);
        let visit = u8::from(conversion == 1 || rng.gen_bool(0.1));
        let spend = if conversion == 1 { rng.gen_range(20.0..400.0) } else { 0.0 };
        csv.push_str(&format!(
            "{},{:.2},{},{},{},{},{},{},{:.2}\n",
            recency, history, mens, zip, channel, segment, visit, conversion, spend
        ));
    }
    csv
}

fn campaign(n: usize, seed: u64) -> Dataset {
    Dataset::from_reader(campaign_csv(n, seed).as_bytes()).unwrap()
}

fn small_config() -> UpliftConfig {
    UpliftConfig::default().set_n_estimators(20).set_max_depth(Some(4))
}

#[test]
fn test_loaded_dataset_schema() {
    let df = campaign(300, 0);
    assert_eq!(df.rows(), 300);
    assert!(df.numeric("recency").is_ok());
    assert!(df.categorical("segment").is_ok());
    assert!(df.categorical("zip_code").is_ok());

    let features = default_features(&prepare_treatment(&df, MENS_EMAIL, NO_EMAIL).unwrap());
    let names: Vec<&str> = features.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["recency", "history", "mens", "zip_code", "channel"]);
}

#[test]
fn test_uplift_pipeline_end_to_end() {
    let df = campaign(3000, 1);
    let report = run_uplift_and_roi(&df, MENS_EMAIL, NO_EMAIL, None, &small_config(), &RoiConfig::default()).unwrap();

    let held_out = &report.held_out;
    assert_eq!(held_out.len(), 600);
    assert!(held_out.treatment.iter().any(|&t| t == 1.0));
    assert!(held_out.treatment.iter().any(|&t| t == 0.0));

    // The last curve point is the overall response difference.
    let n_t = held_out.treatment.iter().sum::<f64>();
    let n_c = held_out.len() as f64 - n_t;
    let resp_t: f64 = held_out.y_true.iter().zip(&held_out.treatment).map(|(y, t)| y * t).sum();
    let resp_c: f64 = held_out.y_true.iter().zip(&held_out.treatment).map(|(y, t)| y * (1.0 - t)).sum();
    let last = report.curve.qini[report.curve.len() - 1];
    assert!((last - (resp_t / n_t - resp_c / n_c)).abs() < 1e-12);
    assert!((report.baseline[report.baseline.len() - 1] - last).abs() < 1e-12);

    // The model should rank better than random targeting.
    assert!(report.qini_auc > 0.0, "qini auc {}", report.qini_auc);

    for row in report.roi.iter() {
        assert!((-1.0..=1.0).contains(&row.uplift_at_k));
        assert!((row.net_profit - (row.revenue_gain - row.email_cost)).abs() < 1e-9);
    }
    let best = report.roi.best().unwrap();
    assert!(report.roi.iter().all(|r| r.net_profit <= best.net_profit));
}

#[test]
fn test_uplift_is_deterministic() {
    let df = prepare_treatment(&campaign(900, 2), WOMENS_EMAIL, NO_EMAIL).unwrap();
    let features = vec![
        FeatureSpec::numeric("recency"),
        FeatureSpec::numeric("history"),
        FeatureSpec::categorical("channel"),
    ];
    let a = train_uplift_tlearner(&df, &features, &small_config()).unwrap();
    let b = train_uplift_tlearner(&df, &features, &small_config().set_num_threads(Some(3))).unwrap();
    assert_eq!(a.uplift_pred, b.uplift_pred);

    let curve_a = qini_curve(&a.y_true, &a.uplift_pred, &a.treatment).unwrap();
    let curve_b = qini_curve(&b.y_true, &b.uplift_pred, &b.treatment).unwrap();
    assert_eq!(curve_a, curve_b);

    let c = train_uplift_tlearner(&df, &features, &small_config().set_seed(7)).unwrap();
    assert_ne!(a.uplift_pred, c.uplift_pred);
}

#[test]
fn test_config_files_drive_the_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let uplift_path = dir.path().join("uplift.json");
    let roi_path = dir.path().join("roi.json");
    small_config().set_seed(5).save(&uplift_path).unwrap();
    RoiConfig::default().set_ks(vec![0.1, 0.5]).save(&roi_path).unwrap();

    let uplift_cfg = UpliftConfig::load(&uplift_path).unwrap();
    let roi_cfg = RoiConfig::load(&roi_path).unwrap();
    assert_eq!(uplift_cfg.seed, 5);

    let df = campaign(600, 3);
    let report = run_uplift_and_roi(&df, WOMENS_EMAIL, NO_EMAIL, None, &uplift_cfg, &roi_cfg).unwrap();
    assert_eq!(report.roi.len(), 2);
    assert_eq!(report.roi.rows[0].n_targeted, 12);
}

#[test]
fn test_ab_tests_on_campaign() {
    let df = campaign(3000, 4);
    let report = run_ab_tests(&df).unwrap();
    assert_eq!(report.conversion.len(), 3);
    assert_eq!(report.spend.len(), 2);
    let mens = &report.conversion[0].result;
    assert!(mens.abs_lift > 0.0);
    assert!(mens.p_value < 0.05);
    // Both e-mails lift conversion the same way.
    assert!(report.conversion[2].result.p_value > 0.001);
}

#[test]
fn test_scenario_metrics() {
    let y = [1., 0., 1., 0., 1., 0.];
    let t = [1., 1., 0., 0., 1., 0.];
    let s = [0.9, 0.1, 0.8, 0.2, 0.7, 0.05];
    assert_eq!(uplift_at_k(&y, &t, &s, 0.5).unwrap(), 0.0);

    let curve = qini_curve(&y, &s, &t).unwrap();
    let auc = qini_auc(&curve.phi, &curve.qini, &t, &y).unwrap();
    assert!(auc.is_finite());

    let table = simulate_roi(&y, &t, &s, &[0.5, 1.0], 15.0, 0.10).unwrap();
    assert_eq!(table.rows[0].n_targeted, 3);
    assert!((table.rows[0].net_profit + 0.3).abs() < 1e-12);
}

#[test]
fn test_pipeline_errors() {
    let df = campaign(300, 5);
    let cfg = small_config();
    let roi = RoiConfig::default();
    assert!(matches!(
        run_uplift_and_roi(&df, "Unknown", NO_EMAIL, None, &cfg, &roi),
        Err(UpliftError::EmptyArm(_))
    ));
    let leak = vec![FeatureSpec::numeric(OUTCOME_COL)];
    assert!(run_uplift_and_roi(&df, MENS_EMAIL, NO_EMAIL, Some(&leak), &cfg, &roi).is_err());
    assert!(matches!(
        train_uplift_tlearner(&df, &[FeatureSpec::numeric("recency")], &cfg),
        Err(UpliftError::ColumnNotFound(col)) if col == TREATMENT_COL
    ));
}

#[test]
fn test_split_module_is_public() {
    let strata: Vec<usize> = (0..20).map(|i| i % 4).collect();
    let mut rng = StdRng::seed_from_u64(0);
    let (train, test) = uplift_roi::split::stratified_train_test_split(&strata, 0.25, &mut rng).unwrap();
    assert_eq!(test.len(), 5);
    assert_eq!(train.len() + test.len(), 20);
    let labels: Vec<f64> = strata.iter().map(|&s| (s % 2) as f64).collect();
    let folds = uplift_roi::split::stratified_kfold(&labels, 2, &mut rng).unwrap();
    assert_eq!(folds.len(), 2);
}
