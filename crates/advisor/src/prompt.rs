/// Build the advisor prompt from the user's goals and raw transaction text.
///
/// The persona framing and the four numbered asks do most of the work here;
/// the model fills in the rest.
pub(crate) fn build_prompt(financial_goals: &str, transaction_history: &str) -> String {
    format!(
        "You are an expert financial advisor. Your goal is to provide personalized and \
actionable investment advice based on a user's financial goals and transaction history. \
Your advice should be clear, easy to understand for a beginner, and include specific \
portfolio recommendations.

User's Financial Goals: {financial_goals}
User's Recent Transaction History: {transaction_history}

Please provide the following:
1. A brief analysis of their spending habits in relation to their goals.
2. A suggested portfolio allocation (e.g., 60% stocks, 30% bonds, 10% cash).
3. A brief explanation for each asset class recommendation.
4. A list of 3-5 potential investment opportunities that align with their goals and risk profile."
    )
}
