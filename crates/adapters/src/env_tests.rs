use super::*;

#[test]
fn merge_env_overrides_existing_key() {
    let base = vec![("TERM".to_string(), "xterm".to_string())];
    let overrides = vec![("TERM".to_string(), "xterm-256color".to_string())];
    let merged = merge_env(&base, &overrides);
    assert_eq!(merged, vec![("TERM".to_string(), "xterm-256color".to_string())]);
}

#[test]
fn merge_env_appends_new_keys() {
    let base = vec![("TERM".to_string(), "xterm".to_string())];
    let overrides = vec![("COLORTERM".to_string(), "truecolor".to_string())];
    let merged = merge_env(&base, &overrides);
    assert_eq!(merged.len(), 2);
    assert!(merged.contains(&("COLORTERM".to_string(), "truecolor".to_string())));
}

#[test]
fn expand_vars_resolves_from_caller_env() {
    let caller = vec![("WORKSPACE".to_string(), "/tmp/ws".to_string())];
    let expanded = expand_vars("cd ${WORKSPACE}/src", &caller);
    assert_eq!(expanded, "cd /tmp/ws/src");
}

#[test]
fn expand_vars_leaves_unresolved_references_verbatim() {
    let expanded = expand_vars("echo ${DEFINITELY_UNSET_BRUMMER_VAR}", &[]);
    assert_eq!(expanded, "echo ${DEFINITELY_UNSET_BRUMMER_VAR}");
}

#[test]
fn expand_vars_handles_unterminated_braces() {
    let expanded = expand_vars("echo ${OOPS", &[]);
    assert_eq!(expanded, "echo ${OOPS");
}

#[test]
fn expand_vars_prefers_caller_env_over_os_env() {
    std::env::set_var("BRUMMER_ENV_TEST_VAR", "from-os");
    let caller = vec![("BRUMMER_ENV_TEST_VAR".to_string(), "from-caller".to_string())];
    let expanded = expand_vars("${BRUMMER_ENV_TEST_VAR}", &caller);
    assert_eq!(expanded, "from-caller");
    std::env::remove_var("BRUMMER_ENV_TEST_VAR");
}
