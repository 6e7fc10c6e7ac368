//! Starter source files for resources that run user code.

use azdraft_core::{Resource, ResourceType};
use serde::Serialize;

use crate::error::SessionError;

const HTTP_TRIGGER: &str = r#"import { AzureFunction, Context, HttpRequest } from "@azure/functions"

const httpTrigger: AzureFunction = async function (context: Context, req: HttpRequest): Promise<void> {
    context.log('HTTP trigger function processed a request.')

    const name = (req.query.name || (req.body && req.body.name))
    const responseMessage = name
        ? "Hello, " + name + ". This HTTP triggered function executed successfully."
        : "This HTTP triggered function executed successfully. Pass a name in the query string or in the request body for a personalized response."
    context.res = {
        status: 200,
        body: responseMessage
    }
}

export default httpTrigger
"#;

const EXPRESS_APP: &str = r#"const express = require('express')
const app = express()
const port = process.env.PORT || 3000

app.use(express.json())

app.get('/', (req, res) => {
  res.json({ message: 'Welcome to the Express.js Web App!' })
})

app.listen(port, () => {
  console.log(`Server is running on port ${port}`)
})
"#;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedCode {
    pub resource_id: String,
    pub resource_type: ResourceType,
    pub file_name: &'static str,
    pub language: &'static str,
    pub source: &'static str,
}

/// Pick the starter file for `resource`. Only function apps and app services
/// have one.
pub fn starter_code(resource: &Resource) -> Result<GeneratedCode, SessionError> {
    let (file_name, language, source) = match resource.resource_type {
        ResourceType::Function => ("index.ts", "typescript", HTTP_TRIGGER),
        ResourceType::AppService => ("app.js", "javascript", EXPRESS_APP),
        ref other => {
            return Err(SessionError::Unsupported {
                resource_type: other.to_string(),
            })
        }
    };
    Ok(GeneratedCode {
        resource_id: resource.id.clone(),
        resource_type: resource.resource_type.clone(),
        file_name,
        language,
        source,
    })
}
