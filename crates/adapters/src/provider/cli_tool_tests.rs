use super::*;

fn config() -> CliToolConfig {
    let mut flag_mapping = HashMap::new();
    flag_mapping.insert("model".to_string(), "--model".to_string());
    flag_mapping.insert("prompt".to_string(), "--prompt".to_string());
    CliToolConfig {
        command: "echo".to_string(),
        base_args: vec!["base".to_string()],
        flag_mapping,
        working_dir: None,
        environment: Vec::new(),
    }
}

#[test]
fn build_args_includes_base_args_and_mapped_flags() {
    let provider = CliToolProvider::new("echo-provider", config());
    let options = GenerateOptions {
        model: Some("gpt-mini".to_string()),
        ..Default::default()
    };
    let args = provider.build_args("hello", &options);
    assert_eq!(
        args,
        vec!["base", "--model", "gpt-mini", "--prompt", "hello"]
    );
}

#[test]
fn build_args_skips_unmapped_options() {
    let provider = CliToolProvider::new("echo-provider", CliToolConfig::default());
    let args = provider.build_args("hello", &GenerateOptions::default());
    assert!(args.is_empty());
}

#[tokio::test]
async fn generate_code_runs_the_command_and_reports_exit_code() {
    let provider = CliToolProvider::new("echo-provider", config());
    let result = provider
        .generate_code("hello", &GenerateOptions::default())
        .await
        .unwrap();
    assert!(result.code.contains("base"));
    assert_eq!(result.summary, "exit code 0");
    assert_eq!(result.finish_reason.as_deref(), Some("stop"));
}

#[test]
fn validate_config_rejects_unresolvable_command() {
    let provider = CliToolProvider::new(
        "bogus",
        CliToolConfig {
            command: "definitely-not-a-real-binary-xyz".to_string(),
            ..Default::default()
        },
    );
    assert!(provider.validate_config().is_err());
}

#[test]
fn validate_config_accepts_a_resolvable_command() {
    let provider = CliToolProvider::new(
        "echo-provider",
        CliToolConfig {
            command: "echo".to_string(),
            ..Default::default()
        },
    );
    assert!(provider.validate_config().is_ok());
}
