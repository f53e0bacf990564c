use std::env;

pub fn insta_snapshot<F: FnOnce()>(f: F) {
    let mut settings = insta::Settings::clone_current();
    let snapshot_path = env::current_dir().unwrap().join("./test/snapshots");
    settings.set_snapshot_path(snapshot_path);
    settings.bind(f);
}

pub fn job_description_fixture() -> &'static str {
    return r#"
Senior Platform Engineer — Remote (US)

We're a 40-person fintech startup looking for a platform engineer to own our
deployment pipeline and internal developer tooling.

What you'll do:
- Design and operate CI/CD for ~20 services deployed to Kubernetes
- Build internal CLIs and golden-path templates for product teams
- Own observability: metrics, tracing, and on-call runbooks

What we're looking for:
- 5+ years of backend or infrastructure experience
- Fluency in Go, Rust, or Python
- Experience with Terraform and at least one major cloud provider
- Strong written communication; we're async-first

Nice to have:
- Experience in a regulated industry
- Prior startup experience
"#
    .trim();
}

pub fn resume_fixture() -> &'static str {
    return r#"
EXPERIENCE

Software Engineer, Acme Logistics (2019-2024)
- Responsible for the order tracking backend
- Worked on moving services to the cloud
- Helped the team with code reviews and mentoring

Junior Developer, WidgetCo (2017-2019)
- Fixed bugs in the billing system
- Wrote unit tests
"#
    .trim();
}

pub fn long_prompt_fixture() -> String {
    return "a".repeat(60);
}
