//! Notification kinds and parent-facing message templates.
//!
//! Templates are plain values configured once at startup and handed to the
//! dispatcher; the wording depends on the locale, on the parent's gender
//! (honorific) and on the student's gender (son/daughter).

use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::gender::Gender;

/// What a notification is about. Stored in `notification_histories.kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Attendance,
    TestScore,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Attendance => "attendance",
            Self::TestScore => "test_score",
        }
    }
}

/// Message language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// Bahasa Indonesia.
    #[default]
    Id,
    En,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "id" => Ok(Self::Id),
            "en" => Ok(Self::En),
            other => Err(format!("Unsupported locale '{other}'. Must be one of: id, en")),
        }
    }
}

/// Everything a template may reference.
#[derive(Debug, Clone)]
pub struct MessageContext<'a> {
    pub student_name: &'a str,
    pub student_gender: Gender,
    pub grade: i32,
    pub grade_label: &'a str,
    pub parent_name: &'a str,
    pub parent_gender: Gender,
    pub subject_name: &'a str,
    pub date: NaiveDate,
    /// Only used by [`NotificationKind::TestScore`].
    pub score: Option<f64>,
}

/// A rendered subject line and body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedMessage {
    pub subject: String,
    pub body: String,
}

/// Template configuration shared by every dispatch.
#[derive(Debug, Clone)]
pub struct MessageTemplates {
    pub locale: Locale,
    /// Signature line at the bottom of every message.
    pub school_name: String,
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self {
            locale: Locale::Id,
            school_name: "SchoolHub".to_string(),
        }
    }
}

impl MessageTemplates {
    pub fn new(locale: Locale, school_name: impl Into<String>) -> Self {
        Self {
            locale,
            school_name: school_name.into(),
        }
    }

    pub fn render(&self, kind: NotificationKind, ctx: &MessageContext<'_>) -> RenderedMessage {
        match (self.locale, kind) {
            (Locale::Id, NotificationKind::Attendance) => self.attendance_id(ctx),
            (Locale::Id, NotificationKind::TestScore) => self.score_id(ctx),
            (Locale::En, NotificationKind::Attendance) => self.attendance_en(ctx),
            (Locale::En, NotificationKind::TestScore) => self.score_en(ctx),
        }
    }

    fn attendance_id(&self, ctx: &MessageContext<'_>) -> RenderedMessage {
        let honorific = honorific_id(ctx.parent_gender);
        RenderedMessage {
            subject: format!("Pemberitahuan Ketidakhadiran - {}", ctx.student_name),
            body: format!(
                "Yth. {honorific} {parent},\n\n\
                 Kami memberitahukan bahwa {child} {honorific}, {student} (kelas {grade}{label}), \
                 tidak hadir pada pelajaran {subject} tanggal {date}.\n\n\
                 Terima kasih,\n{school}",
                parent = ctx.parent_name,
                child = child_id(ctx.student_gender),
                student = ctx.student_name,
                grade = ctx.grade,
                label = ctx.grade_label,
                subject = ctx.subject_name,
                date = ctx.date.format("%d-%m-%Y"),
                school = self.school_name,
            ),
        }
    }

    fn score_id(&self, ctx: &MessageContext<'_>) -> RenderedMessage {
        let honorific = honorific_id(ctx.parent_gender);
        let child = child_id(ctx.student_gender);
        let result = match ctx.score {
            Some(score) => format!(
                "Berikut kami sampaikan nilai ujian {subject} {child} {honorific}, {student} \
                 (kelas {grade}{label}): {score}.",
                subject = ctx.subject_name,
                student = ctx.student_name,
                grade = ctx.grade,
                label = ctx.grade_label,
                score = format_score(score),
            ),
            None => format!(
                "Kami sampaikan bahwa {child} {honorific}, {student} (kelas {grade}{label}), \
                 belum memiliki nilai ujian {subject}.",
                student = ctx.student_name,
                grade = ctx.grade,
                label = ctx.grade_label,
                subject = ctx.subject_name,
            ),
        };
        RenderedMessage {
            subject: format!("Nilai Ujian {} - {}", ctx.subject_name, ctx.student_name),
            body: format!(
                "Yth. {honorific} {parent},\n\n{result}\n\nTerima kasih,\n{school}",
                parent = ctx.parent_name,
                school = self.school_name,
            ),
        }
    }

    fn attendance_en(&self, ctx: &MessageContext<'_>) -> RenderedMessage {
        RenderedMessage {
            subject: format!("Absence Notice - {}", ctx.student_name),
            body: format!(
                "Dear {honorific} {parent},\n\n\
                 We would like to inform you that your {child}, {student} (grade {grade}{label}), \
                 was absent from {subject} on {date}.\n\n\
                 Kind regards,\n{school}",
                honorific = honorific_en(ctx.parent_gender),
                parent = ctx.parent_name,
                child = child_en(ctx.student_gender),
                student = ctx.student_name,
                grade = ctx.grade,
                label = ctx.grade_label,
                subject = ctx.subject_name,
                date = ctx.date.format("%Y-%m-%d"),
                school = self.school_name,
            ),
        }
    }

    fn score_en(&self, ctx: &MessageContext<'_>) -> RenderedMessage {
        let child = child_en(ctx.student_gender);
        let result = match ctx.score {
            Some(score) => format!(
                "Your {child}, {student} (grade {grade}{label}), scored {score} \
                 on the {subject} test.",
                student = ctx.student_name,
                grade = ctx.grade,
                label = ctx.grade_label,
                score = format_score(score),
                subject = ctx.subject_name,
            ),
            None => format!(
                "Your {child}, {student} (grade {grade}{label}), has no score yet \
                 for the {subject} test.",
                student = ctx.student_name,
                grade = ctx.grade,
                label = ctx.grade_label,
                subject = ctx.subject_name,
            ),
        };
        RenderedMessage {
            subject: format!("{} Test Score - {}", ctx.subject_name, ctx.student_name),
            body: format!(
                "Dear {honorific} {parent},\n\n{result}\n\nKind regards,\n{school}",
                honorific = honorific_en(ctx.parent_gender),
                parent = ctx.parent_name,
                school = self.school_name,
            ),
        }
    }
}

fn honorific_id(gender: Gender) -> &'static str {
    match gender {
        Gender::Male => "Bapak",
        Gender::Female => "Ibu",
    }
}

fn child_id(gender: Gender) -> &'static str {
    match gender {
        Gender::Male => "putra",
        Gender::Female => "putri",
    }
}

fn honorific_en(gender: Gender) -> &'static str {
    match gender {
        Gender::Male => "Mr.",
        Gender::Female => "Mrs.",
    }
}

fn child_en(gender: Gender) -> &'static str {
    match gender {
        Gender::Male => "son",
        Gender::Female => "daughter",
    }
}

/// Whole scores print without decimals, others with one.
pub fn format_score(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{score:.0}")
    } else {
        format!("{score:.1}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(score: Option<f64>) -> MessageContext<'static> {
        MessageContext {
            student_name: "Andi",
            student_gender: Gender::Male,
            grade: 7,
            grade_label: "A",
            parent_name: "Siti",
            parent_gender: Gender::Female,
            subject_name: "Matematika",
            date: NaiveDate::from_ymd_opt(2026, 3, 9).unwrap(),
            score,
        }
    }

    #[test]
    fn indonesian_attendance_uses_gendered_wording() {
        let templates = MessageTemplates::new(Locale::Id, "SMP Negeri 1");
        let msg = templates.render(NotificationKind::Attendance, &ctx(None));
        assert_eq!(msg.subject, "Pemberitahuan Ketidakhadiran - Andi");
        assert!(msg.body.starts_with("Yth. Ibu Siti,"));
        assert!(msg.body.contains("putra Ibu, Andi (kelas 7A)"));
        assert!(msg.body.contains("tanggal 09-03-2026"));
        assert!(msg.body.ends_with("SMP Negeri 1"));
    }

    #[test]
    fn english_attendance_uses_gendered_wording() {
        let templates = MessageTemplates::new(Locale::En, "School");
        let mut c = ctx(None);
        c.parent_gender = Gender::Male;
        c.student_gender = Gender::Female;
        let msg = templates.render(NotificationKind::Attendance, &c);
        assert!(msg.body.starts_with("Dear Mr. Siti,"));
        assert!(msg.body.contains("your daughter, Andi"));
        assert!(msg.body.contains("on 2026-03-09"));
    }

    #[test]
    fn score_template_formats_the_score() {
        let templates = MessageTemplates::default();
        let msg = templates.render(NotificationKind::TestScore, &ctx(Some(87.5)));
        assert_eq!(msg.subject, "Nilai Ujian Matematika - Andi");
        assert!(msg.body.contains(": 87.5."));
    }

    #[test]
    fn missing_score_has_its_own_sentence() {
        let msg = MessageTemplates::default().render(NotificationKind::TestScore, &ctx(None));
        assert!(msg
            .body
            .contains("putra Ibu, Andi (kelas 7A), belum memiliki nilai ujian Matematika."));

        let msg = MessageTemplates::new(Locale::En, "School")
            .render(NotificationKind::TestScore, &ctx(None));
        assert!(msg
            .body
            .contains("Your son, Andi (grade 7A), has no score yet for the Matematika test."));
        assert!(!msg.body.contains("scored"));
    }

    #[test]
    fn format_score_drops_trailing_zero() {
        assert_eq!(format_score(90.0), "90");
        assert_eq!(format_score(72.26), "72.3");
    }

    #[test]
    fn locale_parses() {
        assert_eq!("EN".parse::<Locale>().unwrap(), Locale::En);
        assert!("fr".parse::<Locale>().is_err());
    }

    #[test]
    fn kind_strings_match_column_values() {
        assert_eq!(NotificationKind::Attendance.as_str(), "attendance");
        assert_eq!(NotificationKind::TestScore.as_str(), "test_score");
    }
}
