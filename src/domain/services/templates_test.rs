use super::Templates;

#[test]
fn it_lists_templates_sorted() {
    let names = Templates::list();

    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);

    insta::assert_snapshot!(names.join("\n"), @r###"
    cold-outreach
    cover-letter-closer
    cover-letter-opener
    interview-star-answer
    resume-bullet-rewrite
    thank-you-note
    "###);
}

#[test]
fn it_gets_a_template() {
    let res = Templates::get("cover-letter-opener").unwrap();
    assert!(res.contains("{company}"));
}

#[test]
fn it_fails_on_unknown_template() {
    let res = Templates::get("does-not-exist");
    assert!(res.is_err());
}
