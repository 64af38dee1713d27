use async_graphql::SimpleObject;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, SimpleObject)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuizResponse {
    pub quiz_id: String,
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
#[serde(rename_all = "camelCase")]
pub struct UploadKnowledgeResponse {
    pub project_id: String,
    #[serde(rename = "knowledgeURL")]
    #[graphql(name = "knowledgeURL")]
    pub knowledge_url: String,
}
