//! Compiles the `quiz_questions` cell into questions.
//!
//! Grammar: questions separated by `~`, fields by `|`:
//! `question|correct[|wrong1[|wrong2[|wrong3]]]`. Options are exactly the
//! authored answers; nothing is generated to pad a question out.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::model::{Question, QuestionId};

pub const QUESTION_SEPARATOR: char = '~';
pub const FIELD_SEPARATOR: char = '|';
pub const MAX_WRONG_OPTIONS: usize = 3;

/// Compile a quiz cell. Malformed segments are dropped; ids are assigned
/// `q1`, `q2`, ... over the questions that survive.
pub fn compile_questions<R: Rng + ?Sized>(cell: &str, rng: &mut R) -> Vec<Question> {
    cell.split(QUESTION_SEPARATOR)
        .filter_map(|segment| compile_segment(segment, rng))
        .enumerate()
        .map(|(idx, mut question)| {
            question.id = QuestionId::nth(idx + 1);
            question
        })
        .collect()
}

fn compile_segment<R: Rng + ?Sized>(segment: &str, rng: &mut R) -> Option<Question> {
    let fields: Vec<&str> = segment.split(FIELD_SEPARATOR).map(str::trim).collect();
    if fields.len() < 2 {
        return None;
    }
    let (text, correct) = (fields[0], fields[1]);
    if text.is_empty() || correct.is_empty() {
        return None;
    }

    let mut options = vec![correct.to_owned()];
    for wrong in fields[2..]
        .iter()
        .filter(|w| !w.is_empty() && **w != correct)
        .take(MAX_WRONG_OPTIONS)
    {
        options.push((*wrong).to_owned());
    }
    options.shuffle(rng);

    let correct_index = options.iter().position(|o| o == correct)?;

    Some(Question {
        id: QuestionId::nth(0),
        text: text.to_owned(),
        options,
        correct_index,
        correct_answer: correct.to_owned(),
        explanation: format!("The correct answer is: {correct}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::BTreeSet;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn option_set(q: &Question) -> BTreeSet<&str> {
        q.options.iter().map(String::as_str).collect()
    }

    #[test]
    fn single_question_keeps_authored_options() {
        let questions = compile_questions("What is 2+2?|4|3|5", &mut rng());
        assert_eq!(questions.len(), 1);
        let q = &questions[0];
        assert_eq!(q.id.as_str(), "q1");
        assert_eq!(q.correct_answer, "4");
        assert_eq!(option_set(q), BTreeSet::from(["3", "4", "5"]));
        assert_eq!(q.options[q.correct_index], "4");
        assert_eq!(q.explanation, "The correct answer is: 4");
    }

    #[test]
    fn never_invents_distractors() {
        let questions = compile_questions("Q1|A~Q2|B|C", &mut rng());
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].options, vec!["A"]);
        assert_eq!(questions[0].correct_index, 0);
        assert_eq!(option_set(&questions[1]), BTreeSet::from(["B", "C"]));
        assert_eq!(questions[1].id.as_str(), "q2");
    }

    #[test]
    fn drops_segments_without_an_answer() {
        let questions = compile_questions("lonely~Q|A|B~|~Q3||x", &mut rng());
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].text, "Q");
        assert_eq!(questions[0].id.as_str(), "q1");
    }

    #[test]
    fn caps_wrong_options_and_skips_duplicates() {
        let questions = compile_questions("Q|A|A|B||C|D|E", &mut rng());
        let q = &questions[0];
        assert_eq!(option_set(q), BTreeSet::from(["A", "B", "C", "D"]));
        assert_eq!(q.options.iter().filter(|o| *o == "A").count(), 1);
    }

    #[test]
    fn correct_index_tracks_shuffle_for_many_seeds() {
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            for q in compile_questions("Q|right|w1|w2|w3~R|yes|no", &mut rng) {
                assert_eq!(q.options[q.correct_index], q.correct_answer);
                assert!(q.is_correct(q.correct_index));
            }
        }
    }
}
