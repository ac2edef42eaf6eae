use askama::Template;
use axum::{
    Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    extract::multipart::MultipartError,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Extension, Form,
};
use chrono::NaiveDateTime;
use serde::Deserialize;
use validator::Validate;

use crate::{
    api::{
        middleware::auth::{self, verify_csrf, CurrentUser},
        state::AppState,
    },
    domain::{AnnouncementKind, CreateAnnouncementRequest, KindFilter},
    error::{validation_messages, AppError},
    web::{
        templates::{HtmlTemplate, Nav},
        uploads::{discard_uploaded_file, save_uploaded_file, too_large_message},
    },
};
use super::{announcement_cards, AnnouncementCard};

/// Room for the text fields and multipart framing on top of the file itself.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

const DUE_DATE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"];

pub fn announcement_routes(state: &AppState) -> Router<AppState> {
    let body_limit = state.settings.uploads.max_bytes + FORM_OVERHEAD_BYTES;

    let authoring = Router::new()
        .route("/create", get(create_page).post(create_announcement))
        .route_layer(DefaultBodyLimit::max(body_limit))
        .route_layer(middleware::from_fn(auth::require_teacher_or_admin));

    Router::new()
        .route("/view/:id", get(view_announcement))
        .route("/list", get(list_announcements))
        .route("/delete/:id", post(delete_announcement))
        .merge(authoring)
}

pub struct KindOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

fn kind_options(selected: Option<AnnouncementKind>) -> Vec<KindOption> {
    AnnouncementKind::ALL
        .into_iter()
        .map(|kind| KindOption {
            value: kind.as_str(),
            label: kind.label(),
            selected: Some(kind) == selected,
        })
        .collect()
}

#[derive(Template)]
#[template(path = "announcements/create.html")]
pub struct CreateAnnouncementTemplate {
    pub nav: Nav,
    pub csrf_token: String,
    pub errors: Vec<String>,
    pub title: String,
    pub content: String,
    pub due_date: String,
    pub kinds: Vec<KindOption>,
    pub allowed_extensions: String,
    pub max_upload_mb: usize,
}

#[derive(Template)]
#[template(path = "announcements/view.html")]
pub struct ViewAnnouncementTemplate {
    pub nav: Nav,
    pub csrf_token: String,
    pub announcement: AnnouncementCard,
}

pub struct FilterTab {
    pub value: &'static str,
    pub label: &'static str,
    pub active: bool,
}

#[derive(Template)]
#[template(path = "announcements/list.html")]
pub struct ListAnnouncementsTemplate {
    pub nav: Nav,
    pub csrf_token: String,
    pub filters: Vec<FilterTab>,
    pub announcements: Vec<AnnouncementCard>,
}

/// Text fields of the create form, as submitted.
#[derive(Debug, Default, Validate)]
pub struct AnnouncementForm {
    pub csrf_token: String,
    #[validate(length(min = 5, max = 200, message = "Title must be between 5 and 200 characters."))]
    pub title: String,
    #[validate(length(min = 10, message = "Content must be at least 10 characters."))]
    pub content: String,
    pub announcement_type: String,
    pub due_date: String,
}

/// Accepts both the plain and the `datetime-local` spelling; blank means none.
pub fn parse_due_date(raw: &str) -> Result<Option<NaiveDateTime>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    DUE_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(Some)
        .ok_or_else(|| "Due date must be in the format YYYY-MM-DD HH:MM.".to_string())
}

fn create_template(
    state: &AppState,
    current_user: &CurrentUser,
    form: &AnnouncementForm,
    errors: Vec<String>,
) -> CreateAnnouncementTemplate {
    let uploads = &state.settings.uploads;
    CreateAnnouncementTemplate {
        nav: Nav::for_user(&current_user.user),
        csrf_token: current_user.csrf_token(state),
        errors,
        title: form.title.clone(),
        content: form.content.clone(),
        due_date: form.due_date.clone(),
        kinds: kind_options(
            form.announcement_type
                .parse()
                .ok()
                .or(Some(AnnouncementKind::Announcement)),
        ),
        allowed_extensions: uploads.allowed_extensions.join(", "),
        max_upload_mb: uploads.max_bytes / (1024 * 1024),
    }
}

fn rejected(state: &AppState, current_user: &CurrentUser, form: &AnnouncementForm, errors: Vec<String>) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        HtmlTemplate(create_template(state, current_user, form, errors)),
    )
        .into_response()
}

// GET /announcements/create
pub async fn create_page(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> impl IntoResponse {
    HtmlTemplate(create_template(&state, &current_user, &AnnouncementForm::default(), Vec::new()))
}

type Upload = (String, Vec<u8>);

/// Reads the create form field by field. Whatever arrived before an error is
/// left in `form`, so an oversized body can be answered with the form refilled.
async fn read_create_form(
    multipart: &mut Multipart,
    form: &mut AnnouncementForm,
    upload: &mut Option<Upload>,
) -> Result<(), MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        if name == "file" {
            let filename = field.file_name().unwrap_or_default().to_string();
            let data = field.bytes().await?;
            // Browsers send an empty part when no file was chosen.
            if !filename.is_empty() && !data.is_empty() {
                *upload = Some((filename, data.to_vec()));
            }
            continue;
        }

        let value = field.text().await?;
        match name.as_str() {
            "csrf_token" => form.csrf_token = value,
            "title" => form.title = value.trim().to_string(),
            "content" => form.content = value.trim().to_string(),
            "announcement_type" => form.announcement_type = value,
            "due_date" => form.due_date = value,
            _ => {}
        }
    }
    Ok(())
}

// POST /announcements/create
pub async fn create_announcement(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut form = AnnouncementForm::default();
    let mut upload = None;

    if let Err(err) = read_create_form(&mut multipart, &mut form, &mut upload).await {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            tracing::warn!(user_id = current_user.user.id, "Announcement form over the body limit");
            let message = too_large_message(&state.settings.uploads);
            return Ok(rejected(&state, &current_user, &form, vec![message]));
        }
        return Err(AppError::BadRequest(format!(
            "Malformed form submission: {}",
            err.body_text()
        )));
    }

    verify_csrf(&state, &current_user, &form.csrf_token)?;

    let mut errors = match form.validate() {
        Ok(()) => Vec::new(),
        Err(e) => validation_messages(&e),
    };
    let kind = form.announcement_type.parse::<AnnouncementKind>();
    if kind.is_err() {
        errors.push("Invalid announcement type.".to_string());
    }
    let due_date = parse_due_date(&form.due_date).unwrap_or_else(|message| {
        errors.push(message);
        None
    });

    let kind = match kind {
        Ok(kind) if errors.is_empty() => kind,
        _ => return Ok(rejected(&state, &current_user, &form, errors)),
    };

    let file = match upload {
        Some((filename, data)) => {
            match save_uploaded_file(&state.settings.uploads, &filename, &data).await {
                Ok(stored) => Some(stored),
                Err(AppError::Upload(message)) => {
                    return Ok(rejected(&state, &current_user, &form, vec![message]));
                }
                Err(e) => return Err(e),
            }
        }
        None => None,
    };

    let request = CreateAnnouncementRequest {
        title: form.title.clone(),
        content: form.content.clone(),
        announcement_type: kind,
        due_date,
        file: file.clone(),
    };

    match state
        .service_context
        .announcement_service
        .create(&current_user.user, request)
        .await
    {
        Ok(created) => Ok(Redirect::to(&format!("/announcements/view/{}", created.id)).into_response()),
        Err(e) => {
            if let Some(stored) = &file {
                discard_uploaded_file(&state.settings.uploads, stored).await;
            }
            match e {
                AppError::Validation(message) => Ok(rejected(&state, &current_user, &form, vec![message])),
                other => Err(other),
            }
        }
    }
}

// GET /announcements/view/:id
pub async fn view_announcement(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let announcement = state.service_context.announcement_service.view(id).await?;
    let card = announcement_cards(&state, &current_user.user, vec![announcement])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound("Announcement not found".to_string()))?;

    Ok(HtmlTemplate(ViewAnnouncementTemplate {
        nav: Nav::for_user(&current_user.user),
        csrf_token: current_user.csrf_token(&state),
        announcement: card,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

// GET /announcements/list?type=
pub async fn list_announcements(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = KindFilter::parse(query.kind.as_deref());
    let announcements = state.service_context.announcement_service.list(filter).await?;

    let filters = std::iter::once(("all", "All"))
        .chain(AnnouncementKind::ALL.into_iter().map(|kind| (kind.as_str(), kind.label())))
        .map(|(value, label)| FilterTab {
            value,
            label,
            active: filter.as_str() == value,
        })
        .collect();

    Ok(HtmlTemplate(ListAnnouncementsTemplate {
        nav: Nav::for_user(&current_user.user),
        csrf_token: current_user.csrf_token(&state),
        filters,
        announcements: announcement_cards(&state, &current_user.user, announcements).await?,
    }))
}

#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    pub csrf_token: String,
}

// POST /announcements/delete/:id
pub async fn delete_announcement(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Form(form): Form<DeleteForm>,
) -> Result<Redirect, AppError> {
    verify_csrf(&state, &current_user, &form.csrf_token)?;

    state
        .service_context
        .announcement_service
        .delete(&current_user.user, id)
        .await?;

    Ok(Redirect::to("/announcements/list"))
}
