//! Query intent labels and classification.
//!
//! A query is mapped to one of six coarse intents by the chat model; the
//! label selects the context-guidance line, the reply system prompt, and
//! the canned fallback reply. Classification must never block the pipeline:
//! transport failures and unrecognized labels both collapse to
//! [`Intent::General`].

use tracing::warn;

use crate::llm::TextGenerator;

/// Coarse query categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    HackathonIdea,
    ProjectDiscussion,
    PersonalEvent,
    Reminder,
    CareerHelp,
    General,
}

impl Intent {
    pub const ALL: [Intent; 6] = [
        Intent::HackathonIdea,
        Intent::ProjectDiscussion,
        Intent::PersonalEvent,
        Intent::Reminder,
        Intent::CareerHelp,
        Intent::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HackathonIdea => "hackathon_idea",
            Self::ProjectDiscussion => "project_discussion",
            Self::PersonalEvent => "personal_event",
            Self::Reminder => "reminder",
            Self::CareerHelp => "career_help",
            Self::General => "general",
        }
    }

    /// One-line instruction appended to the assembled context.
    pub fn guidance(&self) -> &'static str {
        match self {
            Self::HackathonIdea => {
                "Focus on creative, innovative solutions and technical feasibility."
            }
            Self::ProjectDiscussion => {
                "Provide technical insights and practical development advice."
            }
            Self::PersonalEvent => {
                "Be empathetic and refer to personal experiences when relevant."
            }
            Self::Reminder => {
                "Help organize and prioritize tasks based on importance and deadlines."
            }
            Self::CareerHelp => {
                "Provide professional guidance based on past experiences and goals."
            }
            Self::General => {
                "Be helpful and conversational, drawing from available context when relevant."
            }
        }
    }

    /// System prompt for the reply model.
    pub fn system_prompt(&self) -> &'static str {
        match self {
            Self::HackathonIdea => {
                "You are Twin, a helpful AI assistant specializing in innovative thinking \
                 and creative problem-solving. Use the provided context to give relevant, \
                 actionable advice for hackathons and innovative projects. If no relevant \
                 context is available, acknowledge this and provide general helpful guidance."
            }
            Self::ProjectDiscussion => {
                "You are Twin, a technical AI assistant. Use the provided context to give \
                 specific, practical advice about projects and development. Reference past \
                 projects and experiences when relevant. If the context doesn't contain \
                 relevant technical information, say so and provide general technical guidance."
            }
            Self::PersonalEvent => {
                "You are Twin, a caring AI companion who remembers personal experiences and \
                 events. Use the provided context to reference past conversations and personal \
                 memories when relevant. Be empathetic and personal in your responses. If you \
                 don't have relevant personal context, acknowledge this warmly."
            }
            Self::Reminder => {
                "You are Twin, an organized AI assistant helping with tasks and reminders. \
                 Use the provided context to understand priorities and deadlines. Reference \
                 past tasks and commitments when relevant. If no relevant context about tasks \
                 is available, acknowledge this and help organize the current request."
            }
            Self::CareerHelp => {
                "You are Twin, a professional AI mentor. Use the provided context to give \
                 personalized career advice based on past experiences, goals, and professional \
                 history. If limited career context is available, acknowledge this and provide \
                 general professional guidance."
            }
            Self::General => {
                "You are Twin, a helpful AI assistant. Use the provided context when relevant \
                 to give personalized responses. If the context doesn't seem relevant to the \
                 current question, acknowledge this and provide helpful general assistance. \
                 Always be honest about what you do and don't know from the context."
            }
        }
    }

    /// Canned reply when the chat model is unavailable. The assistant always
    /// answers with something.
    pub fn fallback_reply(&self) -> &'static str {
        match self {
            Self::HackathonIdea => {
                "I'd love to help with your hackathon idea! Could you share more details \
                 about what you're working on?"
            }
            Self::ProjectDiscussion => {
                "I'm here to help with your project. Could you provide more specific details \
                 about what you need assistance with?"
            }
            Self::PersonalEvent => {
                "I'm sorry, I'm having trouble accessing information right now. Could you \
                 remind me about what we were discussing?"
            }
            Self::Reminder => {
                "I want to help you stay organized! Could you tell me more about what you \
                 need to remember?"
            }
            Self::CareerHelp => {
                "I'd be happy to help with career guidance. What specific area would you \
                 like to discuss?"
            }
            Self::General => {
                "I'm here to help! Could you provide a bit more context about what you're \
                 looking for?"
            }
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Intent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hackathon_idea" => Ok(Self::HackathonIdea),
            "project_discussion" => Ok(Self::ProjectDiscussion),
            "personal_event" => Ok(Self::PersonalEvent),
            "reminder" => Ok(Self::Reminder),
            "career_help" => Ok(Self::CareerHelp),
            "general" => Ok(Self::General),
            _ => Err(format!("unknown intent: {s}")),
        }
    }
}

const CLASSIFIER_SYSTEM_PROMPT: &str =
    "You are an intent classifier. Analyze the user message and return ONLY the most \
     relevant intent from the given list. Be precise and consider context.";

fn classifier_prompt(message: &str) -> String {
    format!(
        "Classify this message: \"{message}\"\n\n\
         Available intents:\n\
         - hackathon_idea: Ideas, brainstorming, innovation\n\
         - project_discussion: Technical projects, coding, development\n\
         - personal_event: Life events, experiences, personal stories\n\
         - reminder: Tasks, deadlines, things to remember\n\
         - career_help: Job advice, career guidance, professional development\n\
         - general: Everything else\n\n\
         Respond with only the intent name."
    )
}

/// Classify a message into one of the six intents.
///
/// Anything unexpected — transport failure, extra prose, a hallucinated
/// label — falls back to [`Intent::General`].
pub async fn classify(generator: &dyn TextGenerator, message: &str) -> Intent {
    match generator
        .complete(CLASSIFIER_SYSTEM_PROMPT, &classifier_prompt(message), 0.1)
        .await
    {
        Ok(reply) => reply
            .trim()
            .to_lowercase()
            .parse()
            .unwrap_or(Intent::General),
        Err(err) => {
            warn!(error = %err, "intent classification failed, using general");
            Intent::General
        }
    }
}
