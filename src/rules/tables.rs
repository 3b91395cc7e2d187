//! Embedded rule tables.
//!
//! Everything here is plain data. Table order is observable: the symptom
//! extractor scans EMERGENCY → URGENT → CATALOGUE and the first pattern that
//! produces a given symptom name decides its category and severity.

use crate::models::{CrisisSeverity, Severity, SymptomCategory, TriageLevel};

/// Bumped whenever any table below changes meaning.
pub const RULE_SET_VERSION: &str = "2.3.0";

/// A literal pattern that, when contained in the normalized query, yields a
/// named symptom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymptomPattern {
    pub pattern: &'static str,
    pub name: &'static str,
    pub category: SymptomCategory,
    pub severity: Severity,
}

const fn sp(
    pattern: &'static str,
    name: &'static str,
    category: SymptomCategory,
    severity: Severity,
) -> SymptomPattern {
    SymptomPattern { pattern, name, category, severity }
}

use Severity::{Emergency, Mild, Moderate, Severe};
use SymptomCategory as Cat;

// ── Symptom tables ──────────────────────────────────────────

pub static EMERGENCY_SYMPTOMS: &[SymptomPattern] = &[
    sp("chest pain", "chest pain", Cat::Cardiovascular, Emergency),
    sp("heart attack", "heart attack", Cat::Cardiovascular, Emergency),
    sp("can't breathe", "breathing difficulty", Cat::Respiratory, Emergency),
    sp("cannot breathe", "breathing difficulty", Cat::Respiratory, Emergency),
    sp("difficulty breathing", "breathing difficulty", Cat::Respiratory, Emergency),
    sp("not breathing", "not breathing", Cat::Respiratory, Emergency),
    sp("choking", "choking", Cat::Respiratory, Emergency),
    sp("coughing up blood", "coughing up blood", Cat::Respiratory, Emergency),
    sp("stroke", "stroke", Cat::Neurological, Emergency),
    sp("face drooping", "stroke", Cat::Neurological, Emergency),
    sp("slurred speech", "slurred speech", Cat::Neurological, Emergency),
    sp("seizure", "seizure", Cat::Neurological, Emergency),
    sp("unconscious", "loss of consciousness", Cat::Neurological, Emergency),
    sp("unresponsive", "loss of consciousness", Cat::Neurological, Emergency),
    sp("severe bleeding", "severe bleeding", Cat::Trauma, Emergency),
    sp("anaphylaxis", "anaphylaxis", Cat::Allergic, Emergency),
    sp("throat is closing", "anaphylaxis", Cat::Allergic, Emergency),
    sp("overdose", "overdose", Cat::Toxicological, Emergency),
    sp("poisoning", "poisoning", Cat::Toxicological, Emergency),
];

pub static URGENT_SYMPTOMS: &[SymptomPattern] = &[
    sp("high fever", "high fever", Cat::Infection, Severe),
    sp("severe headache", "severe headache", Cat::Neurological, Severe),
    sp("worst headache", "severe headache", Cat::Neurological, Severe),
    sp("severe abdominal pain", "severe abdominal pain", Cat::Gastrointestinal, Severe),
    sp("severe pain", "severe pain", Cat::Pain, Severe),
    sp("vomiting blood", "vomiting blood", Cat::Gastrointestinal, Severe),
    sp("blood in stool", "blood in stool", Cat::Gastrointestinal, Severe),
    sp("persistent vomiting", "persistent vomiting", Cat::Gastrointestinal, Severe),
    sp("shortness of breath", "shortness of breath", Cat::Respiratory, Severe),
    sp("fainted", "fainting", Cat::Neurological, Severe),
    sp("fainting", "fainting", Cat::Neurological, Severe),
    sp("confused", "confusion", Cat::Neurological, Severe),
    sp("confusion", "confusion", Cat::Neurological, Severe),
    sp("vision loss", "vision loss", Cat::Neurological, Severe),
    sp("loss of vision", "vision loss", Cat::Neurological, Severe),
    sp("broken bone", "fracture", Cat::Trauma, Severe),
    sp("fracture", "fracture", Cat::Trauma, Severe),
    sp("deep cut", "deep laceration", Cat::Trauma, Severe),
    sp("dehydrat", "dehydration", Cat::General, Severe),
];

/// Generic severity-tagged catalogue, scanned last.
pub static SYMPTOM_CATALOGUE: &[SymptomPattern] = &[
    sp("headache", "headache", Cat::Neurological, Moderate),
    sp("migraine", "headache", Cat::Neurological, Moderate),
    sp("fever", "fever", Cat::Infection, Moderate),
    sp("cough", "cough", Cat::Respiratory, Mild),
    sp("wheez", "wheezing", Cat::Respiratory, Moderate),
    sp("sore throat", "sore throat", Cat::Infection, Mild),
    sp("runny nose", "runny nose", Cat::Infection, Mild),
    sp("infection", "infection", Cat::Infection, Moderate),
    sp("nausea", "nausea", Cat::Gastrointestinal, Mild),
    sp("nauseous", "nausea", Cat::Gastrointestinal, Mild),
    sp("vomiting", "vomiting", Cat::Gastrointestinal, Moderate),
    sp("diarrhea", "diarrhea", Cat::Gastrointestinal, Mild),
    sp("abdominal pain", "abdominal pain", Cat::Gastrointestinal, Moderate),
    sp("stomach pain", "abdominal pain", Cat::Gastrointestinal, Moderate),
    sp("stomach ache", "abdominal pain", Cat::Gastrointestinal, Moderate),
    sp("back pain", "back pain", Cat::Pain, Mild),
    sp("joint pain", "joint pain", Cat::Pain, Mild),
    sp("ear pain", "ear pain", Cat::Pain, Mild),
    sp("earache", "ear pain", Cat::Pain, Mild),
    sp("toothache", "toothache", Cat::Pain, Mild),
    sp("dizz", "dizziness", Cat::Neurological, Moderate),
    sp("numbness", "numbness", Cat::Neurological, Moderate),
    sp("blurred vision", "blurred vision", Cat::Neurological, Moderate),
    sp("palpitations", "palpitations", Cat::Cardiovascular, Moderate),
    sp("racing heart", "palpitations", Cat::Cardiovascular, Moderate),
    sp("bleeding", "bleeding", Cat::Trauma, Moderate),
    sp("sprain", "sprain", Cat::Trauma, Mild),
    sp("swelling", "swelling", Cat::General, Mild),
    sp("swollen", "swelling", Cat::General, Mild),
    sp("rash", "rash", Cat::General, Mild),
    sp("fatigue", "fatigue", Cat::General, Mild),
    sp("anxiety", "anxiety", Cat::MentalHealth, Mild),
    sp("anxious", "anxiety", Cat::MentalHealth, Mild),
    sp("depress", "depression", Cat::MentalHealth, Moderate),
    sp("insomnia", "insomnia", Cat::MentalHealth, Mild),
];

/// Literal phrases that put triage straight to EMERGENCY even when no
/// symptom pattern names them.
pub static EMERGENCY_KEYWORDS: &[&str] = &[
    "ambulance",
    "passed out",
    "collapsed",
    "not breathing",
    "turning blue",
    "no pulse",
    "dying",
];

// ── Mental-health crisis triggers ───────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrisisTrigger {
    pub phrase: &'static str,
    pub severity: CrisisSeverity,
}

const fn ct(phrase: &'static str, severity: CrisisSeverity) -> CrisisTrigger {
    CrisisTrigger { phrase, severity }
}

pub static CRISIS_TRIGGERS: &[CrisisTrigger] = &[
    ct("kill myself", CrisisSeverity::High),
    ct("killing myself", CrisisSeverity::High),
    ct("end my life", CrisisSeverity::High),
    ct("ending my life", CrisisSeverity::High),
    ct("take my own life", CrisisSeverity::High),
    ct("suicide", CrisisSeverity::High),
    ct("suicidal", CrisisSeverity::High),
    ct("want to die", CrisisSeverity::High),
    ct("better off dead", CrisisSeverity::High),
    ct("no reason to live", CrisisSeverity::High),
    ct("end it all", CrisisSeverity::High),
    ct("hurt myself", CrisisSeverity::Medium),
    ct("harm myself", CrisisSeverity::Medium),
    ct("self harm", CrisisSeverity::Medium),
    ct("self-harm", CrisisSeverity::Medium),
    ct("cut myself", CrisisSeverity::Medium),
    ct("cutting myself", CrisisSeverity::Medium),
    ct("hopeless", CrisisSeverity::Medium),
    ct("can't go on", CrisisSeverity::Medium),
    ct("no way out", CrisisSeverity::Medium),
    ct("worthless", CrisisSeverity::Medium),
    ct("nobody would miss me", CrisisSeverity::Medium),
];

// ── Conservative bias literals ──────────────────────────────

pub const CHEST_FRAGMENT: &str = "chest";
pub const CHEST_PAIN_PHRASE: &str = "chest pain";
pub const BREATH_FRAGMENT: &str = "breath";
pub const MULTI_SYMPTOM_THRESHOLD: usize = 3;

// ── Red flags ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinRedFlag {
    pub pattern: &'static str,
    pub level: TriageLevel,
    pub reason: &'static str,
}

const fn rf(pattern: &'static str, level: TriageLevel, reason: &'static str) -> BuiltinRedFlag {
    BuiltinRedFlag { pattern, level, reason }
}

/// Default red-flag list used when no external configuration exists.
pub static DEFAULT_RED_FLAGS: &[BuiltinRedFlag] = &[
    rf("chest pain", TriageLevel::Emergency, "Chest pain can signal a cardiac event"),
    rf("difficulty breathing", TriageLevel::Emergency, "Breathing difficulty requires immediate evaluation"),
    rf("can't breathe", TriageLevel::Emergency, "Breathing difficulty requires immediate evaluation"),
    rf("worst headache", TriageLevel::Emergency, "Sudden severe headache can indicate bleeding in the brain"),
    rf("sudden numbness", TriageLevel::Emergency, "Sudden numbness can indicate a stroke"),
    rf("suicid", TriageLevel::Emergency, "Suicidal thoughts require immediate crisis support"),
    rf("overdose", TriageLevel::Emergency, "Possible overdose"),
    rf("stiff neck", TriageLevel::Urgent, "Stiff neck with illness can indicate meningitis"),
    rf("blood in", TriageLevel::Urgent, "Blood in stool, urine or vomit needs prompt evaluation"),
    rf("high fever", TriageLevel::Urgent, "High fever needs prompt medical review"),
    rf("pregnant and bleeding", TriageLevel::Emergency, "Bleeding during pregnancy needs immediate care"),
];

/// Substituted whenever the configured red-flag list cannot be used.
pub static MINIMAL_RED_FLAGS: &[BuiltinRedFlag] = &[
    rf("chest pain", TriageLevel::Emergency, "Chest pain can signal a cardiac event"),
    rf("difficulty breathing", TriageLevel::Emergency, "Breathing difficulty requires immediate evaluation"),
];

// ── Emergency detector lists ────────────────────────────────

pub static MEDICAL_EMERGENCY_PATTERNS: &[&str] = &[
    "chest pain",
    "heart attack",
    "can't breathe",
    "cannot breathe",
    "not breathing",
    "difficulty breathing",
    "choking",
    "stroke",
    "face drooping",
    "slurred speech",
    "seizure",
    "unconscious",
    "unresponsive",
    "anaphylaxis",
    "severe allergic reaction",
    "throat is closing",
    "overdose",
    "poisoning",
    "coughing up blood",
    "vomiting blood",
];

pub static TRAUMA_EMERGENCY_PATTERNS: &[&str] = &[
    "severe bleeding",
    "bleeding heavily",
    "won't stop bleeding",
    "gunshot",
    "stabbed",
    "car accident",
    "hit by a car",
    "head injury",
    "broken neck",
    "severe burn",
    "fell from",
];

/// Concerning but subtler signals; lowest-priority detector source.
pub static CONCERNING_PATTERNS: &[&str] = &[
    "chest tightness",
    "chest pressure",
    "shortness of breath",
    "sudden headache",
    "worst headache",
    "sudden numbness",
    "confusion",
    "fainted",
    "fainting",
    "high fever",
    "blood in",
];

// ── ATD high-risk co-occurrence ─────────────────────────────

/// Symptom-name fragments whose co-occurrence forces provider routing.
pub static HIGH_RISK_PAIRS: &[(&str, &str)] = &[
    ("chest", "breath"),
    ("headache", "vision"),
    ("fever", "confusion"),
    ("bleeding", "pain"),
    ("fever", "rash"),
    ("headache", "numbness"),
];

// ── Post-processor rewrite tables ───────────────────────────

/// Overconfident diagnostic phrasing → hedged equivalent. Longer phrases
/// come first so they win over their own prefixes.
pub static OVERCONFIDENT_REWRITES: &[(&str, &str)] = &[
    ("you definitely have", "you might have"),
    ("you certainly have", "you might have"),
    ("you are suffering from", "you may be experiencing"),
    ("this is definitely", "this could be"),
    ("this is clearly", "this may be"),
    ("i am certain", "it is possible"),
    ("i'm certain", "it is possible"),
    ("the diagnosis is", "one possible explanation is"),
    ("you need to take", "you could ask your doctor about taking"),
    ("you should take", "you could discuss with your doctor whether to take"),
    ("this will cure", "this may help with"),
    ("guaranteed to", "likely to"),
    ("you have", "you may have"),
];

/// Medical-term phrasing that gets a cautionary hedge.
pub static MEDICAL_TERM_REWRITES: &[(&str, &str)] = &[
    ("is diagnosed with", "may be evaluated for"),
    ("is a symptom of", "can sometimes be associated with"),
    ("is caused by", "may be related to"),
    ("will need surgery", "may be evaluated for possible surgery"),
    ("nothing to worry about", "worth mentioning to a healthcare provider"),
    ("is completely normal", "is often within a typical range"),
];
