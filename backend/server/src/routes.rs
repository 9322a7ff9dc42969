use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use catalog::models::{GeographyFilter, Page, SpiderTypeFilter};
use tracing::{info, warn};

use crate::{
    error::AppError,
    payloads::{
        DistrictList, DistrictRequest, Empty, Envelope, FamilyList, ImageNames, ImageSourceList,
        LocalityRequest, LocationList, ProvinceList, RemoveImagesRequest, Request, SpiderInfo,
        SpiderInfoList, SpiderTypeRequest, SpiderUuid, StatisticsList, UploadImagesRequest,
        UploadedImages,
    },
    state::AppState,
};

type Payload<T> = Result<Json<Request<T>>, JsonRejection>;
type Reply<T> = Result<Json<Envelope<T>>, AppError>;

fn unpack<T>(payload: Payload<T>) -> Result<Request<T>, AppError> {
    match payload {
        Ok(Json(request)) => Ok(request),
        Err(rejection) => {
            warn!("Rejected request body: {rejection}");
            Err(rejection.into())
        }
    }
}

fn reply<T>(data: T) -> Reply<T> {
    Ok(Json(Envelope::success(data)))
}

pub async fn health_handler() -> Json<Envelope<Empty>> {
    Json(Envelope::success(Empty {}))
}

pub async fn provinces_handler(State(state): State<Arc<AppState>>) -> Reply<ProvinceList> {
    let provinces = state.geographies.provinces().await?;

    reply(provinces.into())
}

pub async fn districts_handler(
    State(state): State<Arc<AppState>>,
    payload: Payload<DistrictRequest>,
) -> Reply<DistrictList> {
    let request = unpack(payload)?;
    let districts = state
        .geographies
        .districts(&request.data.province_name_en)
        .await?;

    reply(districts.into())
}

pub async fn spider_type_geographies_handler(
    State(state): State<Arc<AppState>>,
    payload: Payload<SpiderTypeFilter>,
) -> Reply<LocationList> {
    let request = unpack(payload)?;
    let location_result = state.geographies.by_spider_type(&request.data).await?;

    reply(LocationList { location_result })
}

pub async fn spider_info_handler(
    State(state): State<Arc<AppState>>,
    payload: Payload<SpiderUuid>,
) -> Reply<SpiderInfo> {
    let request = unpack(payload)?;
    let record = state.spiders.spider(&request.data.spider_uuid, false).await?;

    reply(record.into())
}

/// Same lookup as `/spiders/info`, inactive records included.
pub async fn manager_spider_info_handler(
    State(state): State<Arc<AppState>>,
    payload: Payload<SpiderUuid>,
) -> Reply<SpiderInfo> {
    let request = unpack(payload)?;
    let record = state.spiders.spider(&request.data.spider_uuid, true).await?;

    reply(record.into())
}

pub async fn images_handler(
    State(state): State<Arc<AppState>>,
    payload: Payload<ImageNames>,
) -> Reply<ImageSourceList> {
    let request = unpack(payload)?;
    let spider_image_list = state.images.images(&request.data.spider_image_list).await?;

    reply(ImageSourceList { spider_image_list })
}

pub async fn spiders_by_geographies_handler(
    State(state): State<Arc<AppState>>,
    payload: Payload<GeographyFilter>,
) -> Reply<SpiderInfoList> {
    let request = unpack(payload)?;
    let records = state.spiders.by_geographies(&request.data).await?;

    reply(records.into())
}

pub async fn spiders_by_locality_handler(
    State(state): State<Arc<AppState>>,
    payload: Payload<LocalityRequest>,
) -> Reply<SpiderInfoList> {
    let request = unpack(payload)?;
    let records = state
        .spiders
        .by_locality(&request.data.locality, request.data.page())
        .await?;

    reply(records.into())
}

pub async fn spiders_by_type_handler(
    State(state): State<Arc<AppState>>,
    payload: Payload<SpiderTypeRequest>,
) -> Reply<SpiderInfoList> {
    let request = unpack(payload)?;
    let records = state
        .spiders
        .by_type(&request.data.filter(), request.data.page())
        .await?;

    reply(records.into())
}

pub async fn spider_list_handler(
    State(state): State<Arc<AppState>>,
    payload: Payload<Page>,
) -> Reply<SpiderInfoList> {
    let request = unpack(payload)?;
    let records = state.spiders.list(request.data).await?;

    reply(records.into())
}

pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    payload: Payload<SpiderInfo>,
) -> Reply<SpiderUuid> {
    let Request { header, data } = unpack(payload)?;
    info!("Register request from {:?}", header.username);

    let spider_uuid = state
        .spiders
        .register(data.into_record(), &header.username)
        .await?;

    reply(SpiderUuid { spider_uuid })
}

pub async fn edit_handler(
    State(state): State<Arc<AppState>>,
    payload: Payload<SpiderInfo>,
) -> Reply<Empty> {
    let info = unpack(payload)?.data;
    if info.status.is_some() {
        warn!("Ignoring status in edit of {}", info.spider_uuid);
    }

    state.spiders.update(info.into_record()).await?;

    reply(Empty {})
}

pub async fn delete_handler(
    State(state): State<Arc<AppState>>,
    payload: Payload<SpiderUuid>,
) -> Reply<Empty> {
    let request = unpack(payload)?;
    state.spiders.delete(&request.data.spider_uuid).await?;

    reply(Empty {})
}

pub async fn upload_images_handler(
    State(state): State<Arc<AppState>>,
    payload: Payload<UploadImagesRequest>,
) -> Reply<UploadedImages> {
    let request = unpack(payload)?.data;
    let image = state
        .images
        .upload(&request.spider_uuid, &request.list_image_encode)
        .await?;

    reply(UploadedImages { image })
}

pub async fn remove_images_handler(
    State(state): State<Arc<AppState>>,
    payload: Payload<RemoveImagesRequest>,
) -> Reply<Empty> {
    let request = unpack(payload)?.data;
    state
        .images
        .remove(&request.spider_uuid, &request.spider_image_list)
        .await?;

    reply(Empty {})
}

pub async fn statistics_handler(
    State(state): State<Arc<AppState>>,
) -> Reply<StatisticsList> {
    let spider_statistics = state.statistics.statistics().await?;

    reply(StatisticsList { spider_statistics })
}

pub async fn families_handler(
    State(state): State<Arc<AppState>>,
    payload: Payload<Page>,
) -> Reply<FamilyList> {
    let request = unpack(payload)?;
    let family_list = state.statistics.families(request.data).await?;

    reply(FamilyList { family_list })
}
