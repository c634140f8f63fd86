/// Result of running a single combinator's fallible parsing step.
///
/// Kept as a dedicated sum type rather than `Option<T>` so `NoMatch` can never be
/// confused with a legitimate `T` that happens to be `None`-shaped.
#[derive(Debug, Clone)]
pub enum Outcome<T> {
    Match(T),
    NoMatch,
}

impl<T> Outcome<T> {
    pub fn is_match(&self) -> bool {
        matches!(self, Outcome::Match(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Match(t) => Outcome::Match(f(t)),
            Outcome::NoMatch => Outcome::NoMatch,
        }
    }

    pub fn and_then<U>(self, f: impl FnOnce(T) -> Outcome<U>) -> Outcome<U> {
        match self {
            Outcome::Match(t) => f(t),
            Outcome::NoMatch => Outcome::NoMatch,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Outcome::Match(t) => Some(t),
            Outcome::NoMatch => None,
        }
    }
}
