//! Search terms and the query strings built from them.
//!
//! A [`Term`] is one search concept: a list of synonyms combined with `OR`,
//! optional inclusion words combined with `AND`, and optional exclusion
//! words combined with `NOT`. A [`TermSet`] is an ordered list of terms that
//! defines one axis of the co-occurrence matrix.
//!
//! Inclusions and exclusions live on the term itself, so they can never
//! drift out of alignment with the term list.
//!
//! ## Query format
//!
//! ```text
//! ("gene"OR"genetic")AND("brain")NOT("protein")
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TermError;

/// Which list of words on a term an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TermKind {
    /// The synonyms of each term.
    Terms,
    /// Words that must also appear (`AND`).
    Inclusions,
    /// Words that must not appear (`NOT`).
    Exclusions,
}

impl fmt::Display for TermKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Terms => write!(f, "terms"),
            Self::Inclusions => write!(f, "inclusions"),
            Self::Exclusions => write!(f, "exclusions"),
        }
    }
}

/// One search concept.
///
/// The label is always the first synonym. Deserialized terms go through the
/// same validation as [`Term::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTerm")]
pub struct Term {
    synonyms: Vec<String>,
    inclusions: Vec<String>,
    exclusions: Vec<String>,
}

#[derive(Deserialize)]
struct RawTerm {
    synonyms: Vec<String>,
    #[serde(default)]
    inclusions: Vec<String>,
    #[serde(default)]
    exclusions: Vec<String>,
}

impl TryFrom<RawTerm> for Term {
    type Error = TermError;

    fn try_from(raw: RawTerm) -> Result<Self, Self::Error> {
        Term::new(raw.synonyms)?
            .with_inclusions(raw.inclusions)?
            .with_exclusions(raw.exclusions)
    }
}

impl Term {
    /// Creates a term from its synonyms.
    ///
    /// Fails if `synonyms` is empty or any entry is blank or contains a
    /// double quote.
    pub fn new<S: Into<String>>(synonyms: impl IntoIterator<Item = S>) -> Result<Self, TermError> {
        let synonyms = clean_words(synonyms, TermKind::Terms)?;
        if synonyms.is_empty() {
            return Err(TermError::EmptySynonyms);
        }

        Ok(Self {
            synonyms,
            inclusions: Vec::new(),
            exclusions: Vec::new(),
        })
    }

    /// Sets the inclusion words, replacing any existing ones.
    pub fn with_inclusions<S: Into<String>>(
        mut self,
        words: impl IntoIterator<Item = S>,
    ) -> Result<Self, TermError> {
        self.inclusions = clean_words(words, TermKind::Inclusions)?;
        Ok(self)
    }

    /// Sets the exclusion words, replacing any existing ones.
    pub fn with_exclusions<S: Into<String>>(
        mut self,
        words: impl IntoIterator<Item = S>,
    ) -> Result<Self, TermError> {
        self.exclusions = clean_words(words, TermKind::Exclusions)?;
        Ok(self)
    }

    /// The display name of the term.
    pub fn label(&self) -> &str {
        &self.synonyms[0]
    }

    pub fn synonyms(&self) -> &[String] {
        &self.synonyms
    }

    pub fn inclusions(&self) -> &[String] {
        &self.inclusions
    }

    pub fn exclusions(&self) -> &[String] {
        &self.exclusions
    }

    /// Returns the words of the requested kind.
    pub fn words(&self, kind: TermKind) -> &[String] {
        match kind {
            TermKind::Terms => &self.synonyms,
            TermKind::Inclusions => &self.inclusions,
            TermKind::Exclusions => &self.exclusions,
        }
    }

    /// Builds the search clause for this term alone.
    pub fn query(&self) -> String {
        render_query(&self.synonyms, &self.inclusions, &self.exclusions)
    }
}

/// Builds a search clause from raw word lists.
///
/// Synonyms are grouped with `OR`; inclusions, when present, are appended as
/// `AND(...)`; exclusions, when present, as `NOT(...)`.
pub fn build_query(
    synonyms: &[String],
    inclusions: &[String],
    exclusions: &[String],
) -> Result<String, TermError> {
    if synonyms.is_empty() {
        return Err(TermError::EmptySynonyms);
    }
    Ok(render_query(synonyms, inclusions, exclusions))
}

/// Builds the co-occurrence clause for two terms.
///
/// Each term's clause is parenthesized so that its `NOT` group binds only to
/// that term.
pub fn pair_query(a: &Term, b: &Term) -> String {
    format!("({})AND({})", a.query(), b.query())
}

fn render_query(synonyms: &[String], inclusions: &[String], exclusions: &[String]) -> String {
    let mut query = or_group(synonyms);
    if !inclusions.is_empty() {
        query.push_str("AND");
        query.push_str(&or_group(inclusions));
    }
    if !exclusions.is_empty() {
        query.push_str("NOT");
        query.push_str(&or_group(exclusions));
    }
    query
}

fn or_group(words: &[String]) -> String {
    let quoted: Vec<String> = words.iter().map(|w| format!("\"{w}\"")).collect();
    format!("({})", quoted.join("OR"))
}

fn clean_words<S: Into<String>>(
    words: impl IntoIterator<Item = S>,
    kind: TermKind,
) -> Result<Vec<String>, TermError> {
    words
        .into_iter()
        .map(|w| {
            let word: String = w.into();
            let word = word.trim().to_string();
            if word.is_empty() {
                Err(TermError::BlankWord { kind })
            } else if word.contains('"') {
                Err(TermError::QuoteInWord(word))
            } else {
                Ok(word)
            }
        })
        .collect()
}

/// An ordered list of terms forming one matrix axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTermSet")]
pub struct TermSet {
    /// Axis name, e.g. "A" or "B".
    name: String,
    terms: Vec<Term>,
}

#[derive(Deserialize)]
struct RawTermSet {
    name: String,
    terms: Vec<Term>,
}

impl TryFrom<RawTermSet> for TermSet {
    type Error = TermError;

    fn try_from(raw: RawTermSet) -> Result<Self, Self::Error> {
        TermSet::from_terms(raw.name, raw.terms)
    }
}

impl TermSet {
    /// Creates an empty term set with the given axis name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            terms: Vec::new(),
        }
    }

    /// Creates a term set from already-built terms.
    pub fn from_terms(name: impl Into<String>, terms: Vec<Term>) -> Result<Self, TermError> {
        check_unique_labels(&terms)?;
        Ok(Self {
            name: name.into(),
            terms,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Number of terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Labels of all terms, in order.
    pub fn labels(&self) -> Vec<&str> {
        self.terms.iter().map(Term::label).collect()
    }

    /// Adds word lists of the given kind.
    ///
    /// For [`TermKind::Terms`] the term list is replaced; each inner list is
    /// one term's synonyms. For inclusions and exclusions there must be
    /// exactly one inner list per term, and an empty inner list clears the
    /// words for that term.
    ///
    /// On error the set is left unchanged.
    pub fn add_terms<S: Into<String>>(
        &mut self,
        lists: Vec<Vec<S>>,
        kind: TermKind,
    ) -> Result<(), TermError> {
        match kind {
            TermKind::Terms => {
                let terms = lists
                    .into_iter()
                    .map(Term::new)
                    .collect::<Result<Vec<_>, _>>()?;
                check_unique_labels(&terms)?;
                self.terms = terms;
            }
            TermKind::Inclusions | TermKind::Exclusions => {
                let cleaned = self.words_per_term(lists, kind)?;
                for (term, words) in self.terms.iter_mut().zip(cleaned) {
                    match kind {
                        TermKind::Inclusions => term.inclusions = words,
                        _ => term.exclusions = words,
                    }
                }
            }
        }
        Ok(())
    }

    /// Appends word lists of the given kind, keeping existing words.
    ///
    /// For [`TermKind::Terms`] each inner list becomes a new term after the
    /// current ones. For inclusions and exclusions there must be exactly one
    /// inner list per term; its words follow the term's existing words.
    ///
    /// On error the set is left unchanged.
    pub fn append_terms<S: Into<String>>(
        &mut self,
        lists: Vec<Vec<S>>,
        kind: TermKind,
    ) -> Result<(), TermError> {
        match kind {
            TermKind::Terms => {
                let mut terms = self.terms.clone();
                for words in lists {
                    terms.push(Term::new(words)?);
                }
                check_unique_labels(&terms)?;
                self.terms = terms;
            }
            TermKind::Inclusions | TermKind::Exclusions => {
                let cleaned = self.words_per_term(lists, kind)?;
                for (term, words) in self.terms.iter_mut().zip(cleaned) {
                    match kind {
                        TermKind::Inclusions => term.inclusions.extend(words),
                        _ => term.exclusions.extend(words),
                    }
                }
            }
        }
        Ok(())
    }

    /// Clears words of the given kind. Clearing `Terms` empties the set.
    pub fn unload(&mut self, kind: TermKind) {
        match kind {
            TermKind::Terms => self.terms.clear(),
            TermKind::Inclusions => self.terms.iter_mut().for_each(|t| t.inclusions.clear()),
            TermKind::Exclusions => self.terms.iter_mut().for_each(|t| t.exclusions.clear()),
        }
    }

    /// Position of the term with the given label.
    pub fn get_index(&self, label: &str) -> Result<usize, TermError> {
        self.terms
            .iter()
            .position(|t| t.label() == label)
            .ok_or_else(|| TermError::UnknownLabel(label.to_string()))
    }

    /// Looks up a term by label.
    pub fn get(&self, label: &str) -> Result<&Term, TermError> {
        let index = self.get_index(label)?;
        Ok(&self.terms[index])
    }

    /// Removes the term with the given label and returns it.
    pub fn drop_term(&mut self, label: &str) -> Result<Term, TermError> {
        let index = self.get_index(label)?;
        Ok(self.terms.remove(index))
    }

    /// Summary of the words of one kind for every term.
    pub fn check_terms(&self, kind: TermKind) -> TermReport<'_> {
        TermReport { set: self, kind }
    }

    fn words_per_term<S: Into<String>>(
        &self,
        lists: Vec<Vec<S>>,
        kind: TermKind,
    ) -> Result<Vec<Vec<String>>, TermError> {
        if lists.len() != self.terms.len() {
            return Err(TermError::LengthMismatch {
                kind,
                expected: self.terms.len(),
                got: lists.len(),
            });
        }
        lists
            .into_iter()
            .map(|words| clean_words(words, kind))
            .collect()
    }
}

fn check_unique_labels(terms: &[Term]) -> Result<(), TermError> {
    for (i, term) in terms.iter().enumerate() {
        if terms[..i].iter().any(|t| t.label() == term.label()) {
            return Err(TermError::DuplicateLabel(term.label().to_string()));
        }
    }
    Ok(())
}

/// Printable listing of a term set, one `label : word, word` line per term.
pub struct TermReport<'a> {
    set: &'a TermSet,
    kind: TermKind,
}

impl fmt::Display for TermReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "List of {} used:", self.kind)?;
        writeln!(f)?;

        let width = self
            .set
            .terms
            .iter()
            .map(|t| t.label().len())
            .max()
            .unwrap_or(0);

        for term in &self.set.terms {
            writeln!(
                f,
                "{:width$}  : {}",
                term.label(),
                term.words(self.kind).join(", "),
                width = width
            )?;
        }
        Ok(())
    }
}

/// Builds a term set from raw word lists.
///
/// All validation happens here, before any network activity.
pub fn build_term_set<S: Into<String>>(
    name: impl Into<String>,
    raw_terms: Vec<Vec<S>>,
    inclusions: Option<Vec<Vec<S>>>,
    exclusions: Option<Vec<Vec<S>>>,
) -> Result<TermSet, TermError> {
    let mut set = TermSet::new(name);
    set.add_terms(raw_terms, TermKind::Terms)?;
    if let Some(inclusions) = inclusions {
        set.add_terms(inclusions, TermKind::Inclusions)?;
    }
    if let Some(exclusions) = exclusions {
        set.add_terms(exclusions, TermKind::Exclusions)?;
    }
    Ok(set)
}
