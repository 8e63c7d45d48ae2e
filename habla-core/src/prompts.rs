// Fixed tutoring templates. Reply shapes are requested, never enforced.

pub const TRANSLATE_SYSTEM: &str = "You are a helpful Spanish language tutor. Translate the English text to Spanish.
Provide natural, conversational Spanish. Format your response as:
Spanish: [translation]
Notes: [any relevant grammar or cultural notes]";

pub const CORRECT_SYSTEM: &str = "You are a helpful Spanish language tutor. Review the Spanish text provided.
If there are errors, provide corrections. If it's correct, confirm it.
Format your response as:
Corrected: [corrected version or \"¡Correcto!\"]
Explanation: [explain any corrections or confirm correctness]
English: [English translation]";

pub const CONVERSE_SPANISH_SYSTEM: &str = "You are a friendly Spanish conversation partner. Respond naturally in Spanish
to continue the conversation. Keep responses conversational and appropriate for language learning.
After your Spanish response, provide:
- English translation in parentheses
- Any corrections to the user's Spanish if needed";

pub const CONVERSE_ENGLISH_SYSTEM: &str = "You are a friendly Spanish conversation partner. The user spoke in English.
Respond in Spanish as if having a natural conversation, and provide the English translation.";

/// A system + user message pair ready for the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system: &'static str,
    pub user: String,
}

pub fn translate_prompt(text: &str) -> PromptPair {
    PromptPair {
        system: TRANSLATE_SYSTEM,
        user: format!("Translate to Spanish: {text}"),
    }
}

pub fn correct_prompt(text: &str) -> PromptPair {
    PromptPair {
        system: CORRECT_SYSTEM,
        user: format!("Review this Spanish text: {text}"),
    }
}

pub fn converse_prompt(text: &str, is_source_spanish: bool) -> PromptPair {
    if is_source_spanish {
        PromptPair {
            system: CONVERSE_SPANISH_SYSTEM,
            user: format!(
                "The user said in Spanish: {text}\nRespond naturally in Spanish and continue the conversation."
            ),
        }
    } else {
        PromptPair {
            system: CONVERSE_ENGLISH_SYSTEM,
            user: format!(
                "The user said in English: {text}\nRespond in Spanish and provide English translation."
            ),
        }
    }
}
