/// Compile a regex literal once and hand out a `&'static Regex`.
#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}

/// Build a [`RuleDef`](crate::config::RuleDef) in the same shape as a rule file entry.
///
/// ```ignore
/// rule_def! {
///     kind: "action",
///     match_type: Prefix,
///     priority: 2,
///     patterns: [r"^[#＃](.+)"],
///     groups: ["content"],
/// }
/// ```
#[macro_export]
macro_rules! rule_def {
    (
        kind: $kind:expr,
        match_type: $strategy:ident,
        priority: $priority:expr,
        patterns: [ $($pat:expr),+ $(,)? ],
        groups: [ $($group:expr),* $(,)? ]
        $(, flags: [ $($flag:expr),* $(,)? ])?
        $(,)?
    ) => {
        $crate::config::RuleDef {
            kind: $kind.to_string(),
            match_type: $crate::MatchStrategy::$strategy,
            priority: $priority,
            patterns: vec![ $($pat.to_string()),+ ],
            groups: vec![ $($group.to_string()),* ],
            flags: vec![ $($($flag.to_string()),*)? ],
        }
    };
}

/// Build a [`MetadataDef`](crate::config::MetadataDef).
#[macro_export]
macro_rules! metadata_def {
    (
        patterns: [ $($pat:expr),+ $(,)? ],
        groups: [ $($group:expr),* $(,)? ]
        $(, flags: [ $($flag:expr),* $(,)? ])?
        $(,)?
    ) => {
        $crate::config::MetadataDef {
            patterns: vec![ $($pat.to_string()),+ ],
            groups: vec![ $($group.to_string()),* ],
            flags: vec![ $($($flag.to_string()),*)? ],
        }
    };
}
