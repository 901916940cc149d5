//! Built-in instruction templates.
//!
//! Both templates drive the same workflow; only the system instructions
//! differ. A template can also be supplied as plain text from a file, in
//! which case none of these apply.

use std::fmt;
use std::str::FromStr;

use anyhow::bail;

/// Named built-in instruction template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InstructionTemplate {
    /// Five-section daily breakdown.
    #[default]
    Mentor,
    /// Three-section short breakdown.
    Brief,
}

impl InstructionTemplate {
    pub fn name(&self) -> &'static str {
        match self {
            InstructionTemplate::Mentor => "mentor",
            InstructionTemplate::Brief => "brief",
        }
    }

    /// Instruction text sent as the system role.
    pub fn text(&self) -> &'static str {
        match self {
            InstructionTemplate::Mentor => MENTOR,
            InstructionTemplate::Brief => BRIEF,
        }
    }
}

impl fmt::Display for InstructionTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for InstructionTemplate {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "mentor" => Ok(InstructionTemplate::Mentor),
            "brief" => Ok(InstructionTemplate::Brief),
            other => bail!("Unknown template: '{}'. Must be mentor or brief.", other),
        }
    }
}

const MENTOR: &str = r#"Ти — ментор-аналітик користувача.
Відповідь завжди має бути українською мовою та строго у форматі Markdown за такою схемою:

Розбір дня за анкетою:

1. Сильні сторони
- [3–5 пунктів, конкретні приклади з тексту анкети]

2. Слабкі місця (прожарка)
- [2–4 пункти, фактами, без образ]

3. Що можна покращити
- [рекомендації для покращення і 1–3 дії, які можна зробити одразу]

4. Проривна ідея
- [1 ідея з високим впливом, короткий план реалізації]

5. Психологічна підтримка
- [2–4 речення щирої підтримки, без кліше]

Правила:
- Не додавати вступу чи висновку поза цими пунктами.
- Кожен розділ починай з жирного заголовка (**...**).
- Використовуй списки для підпунктів.
- Пиши змістовно, дружній тон, орієнтуйся на 1500 символів.
- Звертайся до менті на "Ти".
- Читай "між рядків": не прив'язуйся до слів, будь тим, хто бачить суть.
"#;

const BRIEF: &str = r#"Ти — ментор користувача.
Відповідь завжди українською мовою, строго у форматі Markdown за такою схемою:

1. Що вдалося
- [2–3 пункти з конкретикою з анкети]

2. Що заважало
- [1–2 пункти, фактами]

3. Крок на завтра
- [одна конкретна дія]

Правила:
- Без вступу та висновку.
- Кожен розділ починай з жирного заголовка (**...**).
- Орієнтуйся на 600 символів, дружній тон, звертайся на "Ти".
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!(
            "mentor".parse::<InstructionTemplate>().unwrap(),
            InstructionTemplate::Mentor
        );
        assert_eq!(
            " brief ".parse::<InstructionTemplate>().unwrap(),
            InstructionTemplate::Brief
        );
        assert!("weekly".parse::<InstructionTemplate>().is_err());
    }

    #[test]
    fn test_templates_differ() {
        assert!(InstructionTemplate::Mentor.text().contains("Проривна ідея"));
        assert!(!InstructionTemplate::Brief.text().contains("Проривна ідея"));
    }
}
