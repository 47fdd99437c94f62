/// Splits a death sentence such as `"Killed at level 20 by a dragon and Bob."`
/// into killer names.
///
/// The killer clause is everything after the first `"by"`; its last
/// character (the closing period) is dropped, it is split on `" and "` and a
/// leading `"a "` or `"an "` is removed from each part. Returns `None` when
/// the sentence has no `"by"`; otherwise the list holds at least one entry.
pub fn parse_killers(sentence: &str) -> Option<Vec<String>> {
    let (_, clause) = sentence.split_once("by")?;
    let clause = drop_last_char(clause.trim());

    Some(clause.split(" and ").map(strip_article).collect())
}

fn drop_last_char(text: &str) -> &str {
    let mut chars = text.chars();
    chars.next_back();
    chars.as_str()
}

fn strip_article(phrase: &str) -> String {
    let phrase = phrase.trim();
    phrase
        .strip_prefix("a ")
        .or_else(|| phrase.strip_prefix("an "))
        .unwrap_or(phrase)
        .trim()
        .to_string()
}
