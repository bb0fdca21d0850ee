//! End-to-end checks on a combined document, before and after turning
//! rules 8 and 11 into loops.
//!
//! Rule 42 matches two-letter words with distinct letters (`ab`, `ba`) and
//! rule 31 matches doubled letters (`aa`, `bb`). With the loops in place,
//! rule 0 accepts `42{k} 31{m}` for any `k > m >= 1`.

use rulematch::{compile_str, run, Document, GrammarAnalysis, MatchConfig, Matcher};

const INPUT: &str = r#"0: 8 11
8: 42
11: 42 31
42: 1 2 | 2 1
31: 1 1 | 2 2
1: "a"
2: "b"

ababaa
abbaaa
ababab
abaa
abbaabaabb
abababaa
ababaabb
abaabaaa
bababababaaabbaa
abababa
"#;

fn looped() -> MatchConfig {
    MatchConfig {
        patches: vec!["8: 42 | 42 8".to_string(), "11: 42 31 | 42 11 31".to_string()],
        ..MatchConfig::default()
    }
}

fn matched_lines(config: &MatchConfig) -> Vec<String> {
    run(&Document::parse(INPUT), config)
        .unwrap()
        .verdicts
        .into_iter()
        .filter(|v| v.matched)
        .map(|v| v.line)
        .collect()
}

#[test]
fn fixed_rules_accept_only_six_letter_words() {
    assert_eq!(matched_lines(&MatchConfig::default()), vec!["ababaa", "abbaaa"]);
}

#[test]
fn looping_rules_accept_longer_words() {
    assert_eq!(
        matched_lines(&looped()),
        vec!["ababaa", "abbaaa", "abbaabaabb", "abababaa", "bababababaaabbaa"]
    );
}

#[test]
fn parallel_and_sequential_runs_agree() {
    let sequential = run(&Document::parse(INPUT), &looped()).unwrap();
    let parallel = run(
        &Document::parse(INPUT),
        &MatchConfig {
            parallel: true,
            ..looped()
        },
    )
    .unwrap();

    assert_eq!(sequential, parallel);
    assert_eq!(parallel.count(), 5);
    assert!(parallel.to_string().ends_with("result is 5\n"));
}

#[test]
fn patched_grammar_is_recursive_but_not_left_recursive() {
    let document = Document::parse(INPUT);
    let grammar = compile_str(&document.rules.join("\n")).unwrap();
    let patched = grammar.patch(["8: 42 | 42 8", "11: 42 31 | 42 11 31"]).unwrap();

    let before = GrammarAnalysis::analyze(&grammar, 0);
    let after = GrammarAnalysis::analyze(&patched, 0);

    assert!(before.recursive_rules.is_empty());
    assert!(after.is_recursive(8));
    assert!(after.is_recursive(11));
    assert!(after.left_recursive_rules.is_empty());
    assert!(after.unreachable_rules.is_empty());
}

#[test]
fn sub_rules_can_be_used_as_start() {
    let grammar = compile_str(&Document::parse(INPUT).rules.join("\n")).unwrap();

    let words = Matcher::new(&grammar, 42).unwrap();
    assert!(words.is_match("ab").unwrap());
    assert!(words.is_match("ba").unwrap());
    assert!(!words.is_match("aa").unwrap());

    let doubles = Matcher::new(&grammar, 31).unwrap();
    assert!(doubles.is_match("bb").unwrap());
    assert!(!doubles.is_match("ab").unwrap());
}
