use bytecraft::output::{format_human, infer_command_name, HumanOutput};

#[test]
fn format_human_includes_sections() {
    let mut human = HumanOutput::new("bytecraft client rm: \"Innovatech Solutions\" moved to the trash");
    human.push_summary("id", "1");
    human.push_detail("task.clientId still set on 1");
    human.push_warning("unread notifications: 9+");
    human.push_next_step("bytecraft trash restore 1");

    let rendered = format_human(&human);
    assert!(rendered.contains("moved to the trash"));
    assert!(rendered.contains("Summary:"));
    assert!(rendered.contains("- id: 1"));
    assert!(rendered.contains("Details:"));
    assert!(rendered.contains("- task.clientId still set on 1"));
    assert!(rendered.contains("Warnings:"));
    assert!(rendered.contains("- unread notifications: 9+"));
    assert!(rendered.contains("Next steps:"));
    assert!(rendered.contains("- bytecraft trash restore 1"));
}

#[test]
fn format_human_omits_empty_sections() {
    let human = HumanOutput::new("bytecraft trash: empty");
    let rendered = format_human(&human);
    assert_eq!(rendered, "bytecraft trash: empty");
}

#[test]
fn command_name_skips_global_flags_and_values() {
    let args = |raw: &[&str]| raw.iter().map(|s| s.to_string()).collect::<Vec<_>>();

    assert_eq!(
        infer_command_name(args(&["--data-dir", "/tmp/bc", "--json", "task", "toggle", "1"])),
        "task toggle"
    );
    assert_eq!(infer_command_name(args(&["--offline", "dashboard"])), "dashboard");
    assert_eq!(infer_command_name(args(&["client"])), "client");
    assert_eq!(infer_command_name(args(&["--json"])), "bytecraft");
}
