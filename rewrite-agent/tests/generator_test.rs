use rewrite_agent::Generator;
use rewrite_core::GeneratorConfig;
use std::fs;
use std::path::Path;

const FAWVW_RULES: &str = r#"# > 一汽大众
[rewrite_local]
^https?:\/\/oneapp-api\.faw-vw\.com\/benefits\/benefitsCard\/getInfo\/v1\?.* mock-response-body data-type=json status-code=200 data={"returnStatus":"SUCCEED","hasMore":false,"data":[]}

[mitm]
hostname = oneapp-api.faw-vw.com
"#;

const AMDC_RULES: &str = r#"# > AMDC
[rewrite_local]
^https?:\/\/amdc\.m\.taobao\.com\/amdc\/mobileDispatch$ url script-response-body https://xiangwanguan.github.io/Shadowrocket/Rewrite/JavaScript/AliAMDC.js

[mitm]
hostname = amdc.m.taobao.com
"#;

fn config(root: &Path, sources: &str) -> GeneratorConfig {
    let generator_dir = root.join("Generator");
    fs::create_dir_all(generator_dir.join("Rules")).unwrap();
    fs::write(generator_dir.join("Rules").join("fawvw.conf"), FAWVW_RULES).unwrap();
    fs::write(generator_dir.join("Rules").join("amdc.conf"), AMDC_RULES).unwrap();

    let sources_path = generator_dir.join("Generate.conf");
    fs::write(&sources_path, sources).unwrap();

    GeneratorConfig {
        sources_path,
        output_dir: root.join("Release"),
        project_name: "融合模块".to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_generate_from_local_sources() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), "# sources\nRules/fawvw.conf\nRules/amdc.conf\n");

    let report = Generator::new(config).unwrap().run().await.unwrap();
    assert_eq!(report.sources_loaded, 2);
    assert_eq!(report.sources_failed, 0);

    let merged_path = dir.path().join("Release").join("Module.sgmodule");
    assert_eq!(report.merged_module.as_deref(), Some(merged_path.as_path()));
    let merged = fs::read_to_string(&merged_path).unwrap();
    assert!(merged.starts_with("#!name=融合模块\n#!desc="));
    assert!(merged.contains("\n[Map Local]\n"));
    assert!(merged.contains("\n[Script]\nAliAMDC =type=http-response"));
    assert!(merged.ends_with("hostname = %APPEND% amdc.m.taobao.com,oneapp-api.faw-vw.com\n"));

    let modules = dir.path().join("Release").join("Modules");
    assert_eq!(report.app_modules.len(), 2);
    let amdc = fs::read_to_string(modules.join("AMDC.sgmodule")).unwrap();
    assert!(amdc.starts_with("#!name=AMDC\n"));
    assert!(modules.join("一汽大众.sgmodule").is_file());
}

#[tokio::test]
async fn test_generate_clears_stale_app_modules() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), "Rules/amdc.conf\n");
    let modules = dir.path().join("Release").join("Modules");
    fs::create_dir_all(&modules).unwrap();
    fs::write(modules.join("Removed.sgmodule"), "#!name=Removed\n").unwrap();

    Generator::new(config).unwrap().run().await.unwrap();

    assert!(!modules.join("Removed.sgmodule").exists());
    assert!(modules.join("AMDC.sgmodule").is_file());
}

#[tokio::test]
async fn test_missing_source_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), "Rules/missing.conf\nRules/amdc.conf\n");

    let report = Generator::new(config).unwrap().run().await.unwrap();
    assert_eq!(report.sources_failed, 1);
    assert_eq!(report.sources_loaded, 1);
    assert!(report.merged_module.is_some());
}

#[tokio::test]
async fn test_no_rules_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), "# nothing enabled\n#Rules/amdc.conf\n");

    let report = Generator::new(config).unwrap().run().await.unwrap();
    assert!(report.merged_module.is_none());
    assert!(!dir.path().join("Release").exists());
}

#[tokio::test]
async fn test_unsavable_app_module_does_not_stop_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), "Rules/split.conf\n");
    fs::write(
        dir.path().join("Generator").join("Rules").join("split.conf"),
        "# > A/B\nDOMAIN,a.example.com,REJECT\n# > Zed\nDOMAIN,z.example.com,REJECT\n",
    )
    .unwrap();

    let report = Generator::new(config).unwrap().run().await.unwrap();

    let modules = dir.path().join("Release").join("Modules");
    assert_eq!(report.app_modules_failed, 1);
    assert_eq!(report.app_modules, vec![modules.join("Zed.sgmodule")]);
    assert!(modules.join("Zed.sgmodule").is_file());
    assert!(dir.path().join("Release").join("Module.sgmodule").is_file());
}
