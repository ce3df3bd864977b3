use super::super::error::NodeError;
use super::super::node::{Comparable, Mockable};
use super::{sample_until, stringify};
use fake::faker::address::en::{BuildingNumber, StreetName};
use fake::faker::internet::en::FreeEmail;
use fake::faker::lorem::en::{Paragraphs, Sentence, Word, Words};
use fake::faker::name::en::Name;
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use serde_json::Value;

fn anchored(class: &str) -> Regex {
    Regex::new(&format!("^(?:{class})$")).expect("static matcher pattern")
}

static WORD: Lazy<Regex> = Lazy::new(|| anchored(r"[A-Za-z\-]+"));
static WORDS: Lazy<Regex> = Lazy::new(|| anchored(r"[A-Za-z\-' ]+"));
static SENTENCE: Lazy<Regex> = Lazy::new(|| anchored(r#"[A-Za-z\-'" ,.!?;]+"#));
static PARAGRAPHS: Lazy<Regex> = Lazy::new(|| anchored(r#"[A-Za-z\-'" ,.!?;\r\n]+"#));

static NAME: Lazy<Regex> = Lazy::new(|| anchored(r"[A-Z][a-zA-Z0-9'. \-]*"));
static EMAIL: Lazy<Regex> = Lazy::new(|| {
    anchored(r"[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9\-]+(?:\.[a-zA-Z0-9\-]+)+")
});
static PHONE: Lazy<Regex> = Lazy::new(|| anchored(r"\+?[0-9xX \-().]+"));
static ADDRESS: Lazy<Regex> = Lazy::new(|| anchored(r"[0-9A-Za-z ,'.]+"));
static UUID4: Lazy<Regex> = Lazy::new(|| {
    anchored(r"[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    Word,
    Words,
    Sentence,
    Paragraphs,
}

impl TextKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "word" => Some(TextKind::Word),
            "words" => Some(TextKind::Words),
            "sentence" => Some(TextKind::Sentence),
            "paragraphs" => Some(TextKind::Paragraphs),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TextKind::Word => "word",
            TextKind::Words => "words",
            TextKind::Sentence => "sentence",
            TextKind::Paragraphs => "paragraphs",
        }
    }

    fn pattern(&self) -> &'static Regex {
        match self {
            TextKind::Word => &WORD,
            TextKind::Words => &WORDS,
            TextKind::Sentence => &SENTENCE,
            TextKind::Paragraphs => &PARAGRAPHS,
        }
    }
}

/// `text({type})`: lorem text checked against a character class.
#[derive(Debug, Clone, PartialEq)]
pub struct TextMatcher {
    kind: Option<TextKind>,
}

impl TextMatcher {
    pub fn new(kind: Option<TextKind>) -> Self {
        Self { kind }
    }

    pub fn declared_kind(&self) -> Option<TextKind> {
        self.kind
    }

    pub fn effective_kind(&self) -> TextKind {
        self.kind.unwrap_or(TextKind::Words)
    }
}

impl Comparable for TextMatcher {
    fn compare(&self, target: &Value) -> bool {
        stringify(target).is_some_and(|s| self.effective_kind().pattern().is_match(&s))
    }
}

impl Mockable for TextMatcher {
    fn mock_with<R: Rng>(&self, rng: &mut R) -> Result<Value, NodeError> {
        let kind = self.effective_kind();
        sample_until(
            "text",
            rng,
            |rng| match kind {
                TextKind::Word => Word().fake_with_rng(rng),
                TextKind::Words => Words(3..6).fake_with_rng::<Vec<String>, _>(rng).join(" "),
                TextKind::Sentence => Sentence(4..10).fake_with_rng(rng),
                TextKind::Paragraphs => Paragraphs(2..4)
                    .fake_with_rng::<Vec<String>, _>(rng)
                    .join("\n\n"),
            },
            |s| kind.pattern().is_match(s),
        )
    }
}

/// Realistic fake data kinds with a fixed shape check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeKind {
    Name,
    Email,
    Phone,
    Address,
}

impl FakeKind {
    pub fn name(&self) -> &'static str {
        match self {
            FakeKind::Name => "name",
            FakeKind::Email => "email",
            FakeKind::Phone => "phone",
            FakeKind::Address => "address",
        }
    }

    fn pattern(&self) -> &'static Regex {
        match self {
            FakeKind::Name => &NAME,
            FakeKind::Email => &EMAIL,
            FakeKind::Phone => &PHONE,
            FakeKind::Address => &ADDRESS,
        }
    }

    fn generate<R: Rng>(&self, rng: &mut R) -> String {
        match self {
            FakeKind::Name => Name().fake_with_rng(rng),
            FakeKind::Email => FreeEmail().fake_with_rng(rng),
            FakeKind::Phone => PhoneNumber().fake_with_rng(rng),
            FakeKind::Address => {
                let number: String = BuildingNumber().fake_with_rng(rng);
                let street: String = StreetName().fake_with_rng(rng);
                format!("{number} {street}")
            }
        }
    }
}

/// `name()`, `email()`, `phone()`, `address()`.
#[derive(Debug, Clone, PartialEq)]
pub struct FakeMatcher {
    kind: FakeKind,
}

impl FakeMatcher {
    pub fn new(kind: FakeKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> FakeKind {
        self.kind
    }
}

impl Comparable for FakeMatcher {
    fn compare(&self, target: &Value) -> bool {
        stringify(target).is_some_and(|s| self.kind.pattern().is_match(&s))
    }
}

impl Mockable for FakeMatcher {
    fn mock_with<R: Rng>(&self, rng: &mut R) -> Result<Value, NodeError> {
        let kind = self.kind;
        sample_until(kind.name(), rng, |rng| kind.generate(rng), |s| {
            kind.pattern().is_match(s)
        })
    }
}

/// `uuid4()`: lowercase hyphenated version-4 UUIDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Uuid4Matcher;

impl Comparable for Uuid4Matcher {
    fn compare(&self, target: &Value) -> bool {
        target.as_str().is_some_and(|s| UUID4.is_match(s))
    }
}

impl Mockable for Uuid4Matcher {
    fn mock_with<R: Rng>(&self, rng: &mut R) -> Result<Value, NodeError> {
        let id = uuid::Builder::from_random_bytes(rng.gen()).into_uuid();
        Ok(Value::String(id.hyphenated().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_classes() {
        let word = TextMatcher::new(Some(TextKind::Word));
        assert!(word.compare(&json!("lorem-ipsum")));
        assert!(!word.compare(&json!("two words")));

        let sentence = TextMatcher::new(Some(TextKind::Sentence));
        assert!(sentence.compare(&json!("Hello, world!")));
        assert!(!sentence.compare(&json!("line\nbreak")));

        let paragraphs = TextMatcher::new(Some(TextKind::Paragraphs));
        assert!(paragraphs.compare(&json!("One.\n\nTwo.")));
    }

    #[test]
    fn test_text_defaults_to_words() {
        let m = TextMatcher::new(None);
        assert_eq!(m.effective_kind(), TextKind::Words);
        assert!(m.compare(&json!("a few words")));
        assert!(!m.compare(&json!("no digits 1")));
    }

    #[test]
    fn test_text_mock_round_trip() {
        let mut rng = rand::thread_rng();
        for kind in [TextKind::Word, TextKind::Words, TextKind::Sentence, TextKind::Paragraphs] {
            let m = TextMatcher::new(Some(kind));
            let v = m.mock_with(&mut rng).unwrap();
            assert!(m.compare(&v), "{kind:?}: {v}");
        }
    }

    #[test]
    fn test_fake_kinds_round_trip() {
        let mut rng = rand::thread_rng();
        for kind in [FakeKind::Name, FakeKind::Email, FakeKind::Phone, FakeKind::Address] {
            let m = FakeMatcher::new(kind);
            for _ in 0..5 {
                let v = m.mock_with(&mut rng).unwrap();
                assert!(m.compare(&v), "{kind:?}: {v}");
            }
        }
    }

    #[test]
    fn test_email_mock_always_accepted() {
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        let m = FakeMatcher::new(FakeKind::Email);
        for seed in 0..300u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let v = m.mock_with(&mut rng).unwrap();
            assert!(m.compare(&v), "seed {seed}: {v}");
        }
    }

    #[test]
    fn test_fake_shape_checks() {
        assert!(FakeMatcher::new(FakeKind::Email).compare(&json!("ann.lee@example.com")));
        assert!(FakeMatcher::new(FakeKind::Email).compare(&json!("ali_sit@yahoo.com")));
        assert!(FakeMatcher::new(FakeKind::Email).compare(&json!("a+tag@mail.example.co.uk")));
        assert!(!FakeMatcher::new(FakeKind::Email).compare(&json!("ann@localhost")));
        assert!(!FakeMatcher::new(FakeKind::Email).compare(&json!("not-an-email")));
        assert!(FakeMatcher::new(FakeKind::Phone).compare(&json!("(555) 123-4567 x89")));
        assert!(!FakeMatcher::new(FakeKind::Name).compare(&json!("lowercase start")));
    }

    #[test]
    fn test_uuid4() {
        let m = Uuid4Matcher;
        assert!(m.compare(&json!("0f8fad5b-d9cb-469f-a165-70867728950e")));
        assert!(!m.compare(&json!("0f8fad5b-d9cb-169f-a165-70867728950e")));
        assert!(!m.compare(&json!("0F8FAD5B-D9CB-469F-A165-70867728950E")));
        let v = m.mock_with(&mut rand::thread_rng()).unwrap();
        assert!(m.compare(&v), "{v}");
    }
}
