//! Word-level diff between two renderings of the same message.

use crate::markup::html_escape;

/// `before`/`after` are the longest shared leading/trailing word runs;
/// `prev`/`curr` are what is left in the middle of each side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditDiff {
    pub before: String,
    pub prev: String,
    pub curr: String,
    pub after: String,
}

/// Split both bodies on single spaces and peel off the common prefix and
/// suffix. The suffix never reaches into the prefix on either side, so
/// inserting or deleting a word next to a repeated one stays unambiguous.
pub fn diff(previous: &str, current: &str) -> EditDiff {
    let old: Vec<&str> = previous.split(' ').collect();
    let new: Vec<&str> = current.split(' ').collect();

    let prefix = old
        .iter()
        .zip(new.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let room = old.len().min(new.len()) - prefix;
    let suffix = old
        .iter()
        .rev()
        .zip(new.iter().rev())
        .take(room)
        .take_while(|(a, b)| a == b)
        .count();

    EditDiff {
        before: join(&new[..prefix]),
        prev: join(&old[prefix..old.len() - suffix]),
        curr: join(&new[prefix..new.len() - suffix]),
        after: join(&new[new.len() - suffix..]),
    }
}

fn join(words: &[&str]) -> String {
    words.join(" ").trim().to_string()
}

impl EditDiff {
    /// `(edited) {before} {prev} {after} => {before} {curr} {after}`
    pub fn plain_body(&self) -> String {
        format!(
            "(edited) {} {} {} => {} {} {}",
            self.before, self.prev, self.after, self.before, self.curr, self.after
        )
    }

    /// Same shape as [`plain_body`](Self::plain_body) with the removed span
    /// in red and the added span in green. Only the segments are escaped.
    pub fn formatted_body(&self) -> String {
        let before = html_escape(&self.before);
        let after = html_escape(&self.after);
        format!(
            r#"<i>(edited)</i> {before} <font color="red"> {} </font> {after} =&gt; {before}<font color="green"> {} </font> {after}"#,
            html_escape(&self.prev),
            html_escape(&self.curr),
        )
    }
}
