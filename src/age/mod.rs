// Age rating — minimum recommended age for a piece of text.
//
// A zero-shot model sorts the text into one of seven content categories,
// each mapped to a rating. Low model confidence lowers the rating one step;
// when the model is unavailable a word-count heuristic decides.

pub mod estimator;
pub mod table;
