//! Fixed instruction texts for the three kinds of summarization call

pub const CHUNK_INSIGHTS: &str = "You are an expert AI assistant. Your task is to analyze a new chunk of Telegram chat messages.
You have been provided with a 'Previous Conversation Summary' which summarizes key points from messages processed before this current chunk.
Based on BOTH the 'Previous Conversation Summary' AND the 'Current Message Chunk', identify and extract NEW key insights, decisions, important questions, action items, and main topics from the 'Current Message Chunk' ONLY.
Do not repeat information already well-covered in the 'Previous Conversation Summary' unless the new chunk significantly updates or refutes it or adds crucial new details.
If the 'Current Message Chunk' contains no new salient information, or is just noise/greetings/banter without substance when considering the previous summary, respond with the exact phrase \"NO_NEW_INSIGHTS\".
Otherwise, present the new insights for the current chunk concisely and clearly, using bullet points for distinct items. Focus on actionable and informative content.
The chat messages are in the format 'Sender Name: Message content' or 'Sender Name (replying to 'OriginalSender: Snippet'): Message content'.
";

pub const COMPACT_INSIGHTS: &str = "You are an expert AI assistant. You will be given a 'Collection of Previous Insights' from a long-running Telegram chat. These insights were generated sequentially from chunks of the conversation.
Your task is to synthesize and compact this collection into a single, coherent, and concise 'Updated Conversation Summary so far'.
This summary must retain all unique key information, decisions, questions, action items, and important topic developments mentioned in the individual insights.
Eliminate redundancy, combine related points, and maintain chronological flow where sensible. The goal is a dense, informative summary that is shorter than the sum of its parts but captures all critical information needed to understand the conversation's progression.
Focus on factual extraction and key developments. Use clear language and bullet points for distinct pieces of information where appropriate. This summary will be used as context for processing future message chunks OR as input to a final report.
";

pub const FINAL_REPORT: &str = "You are an expert AI assistant. You have been provided with a 'Consolidated Summary of Key Conversation Insights', which covers a long Telegram chat. These insights have been chronologically ordered and potentially pre-summarized.
Your task is to synthesize these insights into a single, well-structured, highly readable, and comprehensive 'Final Report' of the entire conversation.

The report should be formatted for easy readability by a human. Use clear headings, paragraphs, and MOST IMPORTANTLY, extensive use of bullet points for:
- Key Decisions Made (with when/who if identifiable)
- Major Action Items (assigned to whom if identifiable, and any deadlines)
- Significant Questions Raised (and their resolutions or if they remain open)
- Critical Takeaways and Conclusions

Structure your report logically:
1.  **Executive Summary:** A brief overview (2-3 paragraphs) of the entire conversation's purpose, main outcomes, and critical conclusions.
2.  **Main Themes and Discussion Flow:** Describe the overarching topics and how the conversation evolved.
3.  **Detailed Breakdown:**
    * **Key Decisions:** Use bullet points. For each decision, briefly state the decision and any context.
    * **Action Items:** Use bullet points. For each action item, specify the task, who is responsible (if known), and any deadlines.
    * **Important Questions & Resolutions:** Use bullet points. List key questions, and their answers or current status.
    * **Other Significant Insights/Events:** Use bullet points for any other notable information, topic shifts, or unresolved issues.
4.  **Overall Conclusion/Next Steps (if apparent):** Summarize the final state of the discussion.

Ensure the report is detailed enough to be a standalone useful document. Do not just list the input insights; synthesize, structure, and rephrase them into this formal report format. Be comprehensive.
";

/// Prompt texts keyed the way the state snapshot records them
pub fn recorded() -> [(&'static str, &'static str); 3] {
    [
        ("chunk_insights", CHUNK_INSIGHTS),
        ("compact_insights_collection", COMPACT_INSIGHTS),
        ("final_report", FINAL_REPORT),
    ]
}
