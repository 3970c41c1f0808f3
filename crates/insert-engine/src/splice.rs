//! Text splice around the last trigger occurrence.
//!
//! All offsets are byte offsets into the text as the page port reports it.

/// Outcome of a splice computation: the full replacement text plus the byte
/// range the inserted content occupies inside it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Splice {
    pub new_text: String,
    pub insert_start: usize,
    pub insert_end: usize,
}

/// Replace the last occurrence of `trigger` in `current` with `content`.
///
/// When the trigger is absent: `None` normally, or — on platforms whose
/// frameworks strip transient state between renders (`tolerant`) — an append
/// treating the entire current text as the prefix.
pub fn splice_at_trigger(
    current: &str,
    trigger: &str,
    content: &str,
    tolerant: bool,
) -> Option<Splice> {
    match current.rfind(trigger) {
        Some(index) => {
            let before = &current[..index];
            let after = &current[index + trigger.len()..];
            Some(Splice {
                new_text: format!("{before}{content}{after}"),
                insert_start: index,
                insert_end: index + content.len(),
            })
        }
        None if tolerant => Some(Splice {
            new_text: format!("{current}{content}"),
            insert_start: current.len(),
            insert_end: current.len() + content.len(),
        }),
        None => None,
    }
}
