use std::num::NonZeroUsize;

use bundlegroups::classify::is_whitespace;
use bundlegroups::{GroupLimit, RefKind, Reference, ScanOptions, extract_reference_groups};

const CORPUS: &[&str] = &[
    r#"<script src="a.js"></script><script src="b.js"></script>"#,
    r#"<script src="a.js?v=2"></script><script src="b.js"></script>"#,
    r#"<link rel="stylesheet" href="a.css"><script src="a.js"></script>"#,
    r#"<img src="a.png"><img src="b.png">"#,
    r#"<script src="a.js"></script>Hello<script src="b.js"></script>"#,
    "<script src=\"a.js\"></script>\n<script src=\"b.js\"></script>",
    r#"<!--[if lt IE 9]><script src="shim.js"></script><![endif]-->"#,
    r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>Démo – café</title>
    <link rel="stylesheet" href="css/a.css">
    <!-- theme -->
    <link rel="stylesheet" href="css/b.css">
    <link rel="stylesheet" href="//fonts.example.com/f.css">
    <link rel="stylesheet" href="css/c.css">
    <link rel="stylesheet" href="css/d.css#print">
    <!--[if lt IE 9]>
      <script src="js/html5shiv.js"></script>
      <script src="js/respond.js"></script>
    <![endif]-->
    <script src="js/1.js"></script>
    <script src="js/2.js"></script>
    <script src="js/3.js"></script>
    <script>var inline = "</div>";</script>
    <script src="js/4.js"></script>
  </head>
  <body>
    <picture>
      <source src="img/hero.webp">
      <img src="img/hero.jpg">
    </picture>
    <video><track src="subs/en.vtt"></video>
    <img src="data:image/png;base64,AAAA">
    <link rel="import" href="elements/x-card.html">
    <div><script src="js/widget.js"></script></div>
    <script src="js/5.js"></script>
    <script type="module" src="js/mod.js"></script>
    <script src="js/6.js"></script>
    <p>Fin</p>
  </body>
</html>
"#,
    r#"<html><head><script src="a.js" /><link rel="stylesheet" href="b.css"></head><body><script src="c.js"></script><img src="d.png"></body></html>"#,
    r#"<head><script src="a.js" /><script src="b.js" /></head>"#,
    r#"<script src="a.js"></script></p><script src="b.js"></script>"#,
    r#"<script src="a.js"></script><script src="b.js">"#,
];

fn scan(markup: &str, limit: GroupLimit) -> Vec<Vec<Reference>> {
    extract_reference_groups(markup, &ScanOptions::with_limit(limit)).unwrap()
}

fn urls(groups: &[Vec<Reference>]) -> Vec<Vec<&str>> {
    groups
        .iter()
        .map(|g| g.iter().map(|r| r.url.as_str()).collect())
        .collect()
}

fn limits() -> Vec<GroupLimit> {
    vec![
        GroupLimit::Unbounded,
        GroupLimit::SingletonOnly,
        GroupLimit::Count(NonZeroUsize::new(2).unwrap()),
        GroupLimit::Count(NonZeroUsize::new(3).unwrap()),
    ]
}

/// Strip whitespace, close tags, and plain comments; what remains between
/// two grouped references must be empty.
fn only_ignorable_separators(gap: &str) -> bool {
    let mut rest = gap;
    loop {
        rest = rest.trim_start_matches(|c: char| is_whitespace(&c.to_string()));
        if rest.is_empty() {
            return true;
        }
        if let Some(after) = rest.strip_prefix("<!--") {
            let Some(close) = after.find("-->") else { return false };
            if after[..close].starts_with('[') || &after[..close] == "<![endif]" {
                return false;
            }
            rest = &after[close + 3..];
        } else if rest.starts_with("</") {
            let Some(close) = rest.find('>') else { return false };
            rest = &rest[close + 1..];
        } else {
            return false;
        }
    }
}

#[test]
fn scenario_a_consecutive_scripts_merge() {
    let groups = scan(CORPUS[0], GroupLimit::Unbounded);
    assert_eq!(urls(&groups), [vec!["a.js", "b.js"]]);
}

#[test]
fn scenario_b_query_string_is_a_singleton() {
    let groups = scan(CORPUS[1], GroupLimit::Unbounded);
    assert_eq!(urls(&groups), [vec!["a.js?v=2"], vec!["b.js"]]);
}

#[test]
fn scenario_c_kind_change_breaks() {
    let groups = scan(CORPUS[2], GroupLimit::Unbounded);
    assert_eq!(urls(&groups), [vec!["a.css"], vec!["a.js"]]);
}

#[test]
fn scenario_d_media_never_merges() {
    let groups = scan(CORPUS[3], GroupLimit::Unbounded);
    assert_eq!(urls(&groups), [vec!["a.png"], vec!["b.png"]]);
}

#[test]
fn scenario_e_text_breaks_whitespace_does_not() {
    assert_eq!(scan(CORPUS[4], GroupLimit::Unbounded).len(), 2);
    assert_eq!(urls(&scan(CORPUS[5], GroupLimit::Unbounded)), [vec!["a.js", "b.js"]]);
}

#[test]
fn scenario_f_conditional_comment_offsets() {
    let html = CORPUS[6];
    let groups = scan(html, GroupLimit::Unbounded);
    assert_eq!(groups.len(), 1);
    let shim = &groups[0][0];
    assert_eq!(shim.url, "shim.js");
    assert_eq!(&html[shim.start..shim.end], r#"<script src="shim.js"></script>"#);
}

#[test]
fn full_document_grouping() {
    let groups = scan(CORPUS[7], GroupLimit::Unbounded);
    assert_eq!(
        urls(&groups),
        [
            vec!["css/a.css", "css/b.css"],
            vec!["css/c.css"],
            vec!["css/d.css#print"],
            vec!["js/html5shiv.js", "js/respond.js"],
            vec!["js/1.js", "js/2.js", "js/3.js"],
            vec!["js/4.js"],
            vec!["img/hero.webp"],
            vec!["img/hero.jpg"],
            vec!["subs/en.vtt"],
            vec!["elements/x-card.html"],
            vec!["js/widget.js", "js/5.js"],
            vec!["js/6.js"],
        ]
    );

    let kinds: Vec<RefKind> = groups.iter().map(|g| g[0].kind).collect();
    assert_eq!(kinds[6], RefKind::Source);
    assert_eq!(kinds[7], RefKind::Image);
    assert_eq!(kinds[8], RefKind::Track);
    assert_eq!(kinds[9], RefKind::Import);
}

#[test]
fn offsets_always_slice_to_text() {
    for markup in CORPUS {
        for limit in limits() {
            for reference in scan(markup, limit).iter().flatten() {
                assert!(reference.start < reference.end, "{reference:?}");
                assert_eq!(&markup[reference.start..reference.end], reference.text);
            }
        }
    }
}

#[test]
fn grouped_references_are_contiguous() {
    for markup in CORPUS {
        for group in scan(markup, GroupLimit::Unbounded) {
            for pair in group.windows(2) {
                let gap = &markup[pair[0].end..pair[1].start];
                assert!(only_ignorable_separators(gap), "gap {gap:?} in {markup}");
            }
        }
    }
}

#[test]
fn groups_are_homogeneous_and_capped() {
    for markup in CORPUS {
        for limit in limits() {
            for group in scan(markup, limit) {
                assert!(!group.is_empty());
                assert!(group.iter().all(|r| r.kind == group[0].kind));
                match limit {
                    GroupLimit::Count(max) => assert!(group.len() <= max.get()),
                    GroupLimit::SingletonOnly => assert_eq!(group.len(), 1),
                    GroupLimit::Unbounded => {},
                }
            }
        }
    }
}

#[test]
fn only_local_urls_for_scripts_styles_and_media() {
    for markup in CORPUS {
        for reference in scan(markup, GroupLimit::Unbounded).iter().flatten() {
            if reference.kind == RefKind::Import {
                continue;
            }
            assert!(!reference.url.contains("//"), "{reference:?}");
            assert!(!reference.url.contains(':'), "{reference:?}");
        }
    }
}

#[test]
fn nested_conditional_comments_keep_outer_offsets() {
    let html = r#"<p>x</p><!--[if IE]><link rel="stylesheet" href="ie.css"><link rel="stylesheet" href="ie2.css"><![endif]--><link rel="stylesheet" href="all.css">"#;
    let groups = scan(html, GroupLimit::Unbounded);
    assert_eq!(urls(&groups), [vec!["ie.css", "ie2.css"], vec!["all.css"]]);
    for reference in groups.iter().flatten() {
        assert_eq!(&html[reference.start..reference.end], reference.text);
    }
}

#[test]
fn downlevel_revealed_block_is_closed_by_endif() {
    let html = r#"<!--[if !IE]><!--><script src="a.js"></script><!--<![endif]--><script src="b.js"></script>"#;
    let groups = scan(html, GroupLimit::Unbounded);
    assert_eq!(urls(&groups), [vec!["a.js"], vec!["b.js"]]);
}

#[test]
fn self_closing_script_is_still_a_reference() {
    let groups = scan(CORPUS[8], GroupLimit::Unbounded);
    assert_eq!(urls(&groups), [vec!["a.js"], vec!["b.css"], vec!["c.js"], vec!["d.png"]]);
    assert_eq!(groups[0][0].text, r#"<script src="a.js" />"#);

    let groups = scan(CORPUS[9], GroupLimit::Unbounded);
    assert_eq!(urls(&groups), [vec!["a.js", "b.js"]]);
}

#[test]
fn stray_end_tag_does_not_break_a_group() {
    let groups = scan(CORPUS[10], GroupLimit::Unbounded);
    assert_eq!(urls(&groups), [vec!["a.js", "b.js"]]);
}

#[test]
fn script_left_open_at_end_of_input_still_joins() {
    let html = CORPUS[11];
    let groups = scan(html, GroupLimit::Unbounded);
    assert_eq!(urls(&groups), [vec!["a.js", "b.js"]]);
    let last = &groups[0][1];
    assert!(last.text.starts_with(r#"<script src="b.js">"#), "{last:?}");
    assert_eq!(&html[last.start..last.end], last.text);
}
