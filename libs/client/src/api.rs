//! Typed calls against the Wastewise REST API

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    context::AuthContext,
    error::{ClientError, ClientResult},
    models::{
        Collection, CreditBalance, NewCollection, Payment, Profile, Report, ScanResult, Session,
    },
};

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> ClientResult<Self> {
        let http = Client::builder().user_agent("wastewise-client/0.1").build()?;
        Ok(Self::with_client(http, base_url))
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str, context: &AuthContext) -> RequestBuilder {
        let request = self.http.request(method, self.url(path));
        match context.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::from_body(status, &body));
        }
        Ok(response.json().await?)
    }

    /// A request carrying the context's token; fails when signed out
    fn authorized(
        &self,
        context: &AuthContext,
        method: Method,
        path: &str,
    ) -> ClientResult<RequestBuilder> {
        if context.token().is_none() {
            return Err(ClientError::NotSignedIn);
        }
        Ok(self.request(method, path, context))
    }

    /// Re-fetch the profile behind the context's token.
    ///
    /// A rejected token leaves the context anonymous without an error.
    pub async fn refresh(&self, context: &mut AuthContext) -> ClientResult<()> {
        if context.token().is_none() {
            context.resolve(None);
            return Ok(());
        }

        let request = self.request(Method::GET, "/users/profile", context);
        match self.send::<Profile>(request).await {
            Ok(profile) => {
                debug!(user_id = %profile.id, "Resolved signed-in user");
                context.resolve(Some(profile));
                Ok(())
            }
            Err(err) if err.status() == Some(StatusCode::UNAUTHORIZED) => {
                debug!("Stored token was rejected");
                context.resolve(None);
                Ok(())
            }
            Err(err) => {
                warn!("Failed to resolve signed-in user: {}", err);
                context.abandon();
                Err(err)
            }
        }
    }

    pub async fn register(
        &self,
        context: &mut AuthContext,
        name: &str,
        email: &str,
        password: &str,
    ) -> ClientResult<Session> {
        let request = self
            .http
            .post(self.url("/auth/register"))
            .json(&json!({ "name": name, "email": email, "password": password }));
        let session: Session = self.send(request).await?;
        context.set_token(Some(session.token.clone()));
        self.refresh(context).await?;
        Ok(session)
    }

    pub async fn login(
        &self,
        context: &mut AuthContext,
        email: &str,
        password: &str,
    ) -> ClientResult<Session> {
        let request = self
            .http
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email, "password": password }));
        let session: Session = self.send(request).await?;
        context.set_token(Some(session.token.clone()));
        self.refresh(context).await?;
        Ok(session)
    }

    pub fn logout(&self, context: &mut AuthContext) {
        context.set_token(None);
    }

    pub async fn create_collection(
        &self,
        context: &AuthContext,
        collection: &NewCollection,
    ) -> ClientResult<Collection> {
        let request = self.authorized(context, Method::POST, "/wastes")?;
        self.send(request.json(collection)).await
    }

    pub async fn collection(&self, context: &AuthContext, id: Uuid) -> ClientResult<Collection> {
        let request = self.authorized(context, Method::GET, &format!("/wastes/{}", id))?;
        self.send(request).await
    }

    /// Records created by `user_id`
    pub async fn user_collections(
        &self,
        context: &AuthContext,
        user_id: Uuid,
    ) -> ClientResult<Vec<Collection>> {
        let path = format!("/wastes/user/{}", user_id);
        self.send(self.authorized(context, Method::GET, &path)?)
            .await
    }

    pub async fn update_collection_status(
        &self,
        context: &AuthContext,
        id: Uuid,
        status: &str,
    ) -> ClientResult<Collection> {
        let request = self.authorized(context, Method::PUT, &format!("/wastes/{}", id))?;
        self.send(request.json(&json!({ "status": status }))).await
    }

    pub async fn scan(&self, context: &AuthContext, qr_code: &str) -> ClientResult<ScanResult> {
        let request = self.authorized(context, Method::POST, "/wastes/scan")?;
        self.send(request.json(&json!({ "qrCode": qr_code }))).await
    }

    pub async fn create_payment(
        &self,
        context: &AuthContext,
        amount: f64,
        payment_method: &str,
    ) -> ClientResult<Payment> {
        let request = self.authorized(context, Method::POST, "/payments")?;
        self.send(request.json(&json!({ "amount": amount, "paymentMethod": payment_method })))
            .await
    }

    pub async fn payments(&self, context: &AuthContext) -> ClientResult<Vec<Payment>> {
        self.send(self.authorized(context, Method::GET, "/payments")?)
            .await
    }

    pub async fn recycling_credits(&self, context: &AuthContext) -> ClientResult<i64> {
        let request = self.authorized(context, Method::GET, "/recycling/credits")?;
        let body: Value = self.send(request).await?;
        Ok(body["recyclingCredits"].as_i64().unwrap_or_default())
    }

    pub async fn add_credits(
        &self,
        context: &AuthContext,
        user_id: Uuid,
        credits: i64,
    ) -> ClientResult<CreditBalance> {
        let path = format!("/recycling/add-credits/{}", user_id);
        let request = self.authorized(context, Method::PUT, &path)?;
        self.send(request.json(&json!({ "credits": credits }))).await
    }

    pub async fn generate_report(
        &self,
        context: &AuthContext,
        report_type: &str,
        criteria: &str,
    ) -> ClientResult<Report> {
        let request = self.authorized(context, Method::POST, "/reports")?;
        self.send(request.json(&json!({ "reportType": report_type, "criteria": criteria })))
            .await
    }

    /// Raw bytes of the report's PDF
    pub async fn download_report(&self, context: &AuthContext, id: Uuid) -> ClientResult<Vec<u8>> {
        let response = self
            .authorized(context, Method::GET, &format!("/reports/{}/download", id))?
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::from_body(status, &body));
        }
        Ok(response.bytes().await?.to_vec())
    }
}
