use revise_core::model::{PointKey, SessionContext, StudyItem, SubjectId};

/// Dashboard tally for one subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectProgress {
    pub subject: SubjectId,
    pub mastered: usize,
    pub total: usize,
}

/// Count how many of a subject's items the session has mastered.
///
/// Pure read model over content plus session state; no I/O.
#[must_use]
pub fn subject_progress(
    subject: &SubjectId,
    items: &[StudyItem],
    ctx: &SessionContext,
) -> SubjectProgress {
    let mastered = items
        .iter()
        .filter(|item| {
            let key = PointKey::new(subject.clone(), item.title.clone()).key();
            ctx.mastered().contains(&key)
        })
        .count();

    SubjectProgress {
        subject: subject.clone(),
        mastered,
        total: items.len(),
    }
}
