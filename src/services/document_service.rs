// src/services/document_service.rs

use genpdf::{elements, style, Element};
use image::Luma;
use qrcode::QrCode;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{AvailabilityRepository, PaymentRepository, UserRepository},
};

#[derive(Clone)]
pub struct DocumentService {
    payment_repo: PaymentRepository,
    availability_repo: AvailabilityRepository,
    user_repo: UserRepository,
    pool: PgPool,
}

impl DocumentService {
    pub fn new(
        payment_repo: PaymentRepository,
        availability_repo: AvailabilityRepository,
        user_repo: UserRepository,
        pool: PgPool,
    ) -> Self {
        Self { payment_repo, availability_repo, user_repo, pool }
    }

    /// Recibo do pagamento em PDF, com o QR Code do identificador da
    /// transação no gateway para conferência.
    pub async fn generate_receipt_pdf(&self, payment_id: Uuid) -> Result<Vec<u8>, AppError> {
        // 1. Busca os dados
        let mut conn = self.pool.acquire().await?;

        let payment = self
            .payment_repo
            .find_by_id(&mut *conn, payment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Pagamento não encontrado.".into()))?;

        let student_name = self.user_repo.display_name(&mut *conn, payment.student_id).await?;
        let teacher_name = self.user_repo.display_name(&mut *conn, payment.teacher_id).await?;

        let availability = match payment.availability_id {
            Some(id) => self.availability_repo.find_by_id(&mut *conn, id).await?,
            None => None,
        };

        drop(conn);

        // 2. Configura o PDF
        // Carrega a fonte da pasta 'fonts/'
        let font_family = genpdf::fonts::from_files("./fonts", "Roboto", None)
            .map_err(|_| AppError::FontNotFound("Fonte não encontrada na pasta ./fonts".to_string()))?;

        let mut doc = genpdf::Document::new(font_family);
        doc.set_title(format!("Recibo de Pagamento {}", payment.id));
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(10);
        doc.set_page_decorator(decorator);

        doc.push(
            elements::Paragraph::new("RECIBO DE PAGAMENTO")
                .styled(style::Style::new().bold().with_font_size(18)),
        );
        doc.push(
            elements::Paragraph::new(format!("Pagamento: {}", payment.id))
                .styled(style::Style::new().with_font_size(10)),
        );
        doc.push(elements::Paragraph::new(format!(
            "Data: {}",
            payment.created_at.format("%d/%m/%Y %H:%M")
        )));

        doc.push(elements::Break::new(1.5));

        doc.push(elements::Paragraph::new(format!("Aluno: {}", student_name)));
        doc.push(elements::Paragraph::new(format!("Professor: {}", teacher_name)));

        if let Some(slot) = &availability {
            doc.push(elements::Paragraph::new(format!(
                "Aula: {} — {} das {:02}:00 às {:02}:00",
                slot.title, slot.date, slot.start_hour, slot.end_hour
            )));
        }

        doc.push(elements::Break::new(2));

        // --- TABELA DE VALORES ---
        let mut table = elements::TableLayout::new(vec![4, 2]);
        table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

        let style_bold = style::Style::new().bold();
        table
            .row()
            .element(elements::Paragraph::new("Descrição").styled(style_bold))
            .element(elements::Paragraph::new("Valor").styled(style_bold))
            .push()
            .map_err(|e| AppError::InternalServerError(anyhow::Error::msg(e.to_string())))?;

        let commission_label =
            format!("Comissão da plataforma ({}%)", payment.commission_percentage);
        let rows = [
            ("Valor da aula".to_string(), payment.amount),
            (commission_label, payment.commission_amount),
            ("Repasse ao professor".to_string(), payment.teacher_payout_amount),
        ];

        for (label, value) in rows {
            table
                .row()
                .element(elements::Paragraph::new(label))
                .element(elements::Paragraph::new(format!("{:.2}", value)))
                .push()
                .map_err(|e| AppError::InternalServerError(anyhow::Error::msg(e.to_string())))?;
        }

        doc.push(table);
        doc.push(elements::Break::new(2));

        let mut total_paragraph =
            elements::Paragraph::new(format!("TOTAL PAGO: {:.2}", payment.amount));
        total_paragraph.set_alignment(genpdf::Alignment::Right);
        doc.push(total_paragraph.styled(style::Style::new().bold().with_font_size(12)));

        doc.push(elements::Break::new(2));

        // --- QR CODE DA TRANSAÇÃO ---
        if let Some(gateway_id) = &payment.gateway_transaction_id {
            doc.push(
                elements::Paragraph::new("CONFERÊNCIA DA TRANSAÇÃO")
                    .styled(style::Style::new().bold().with_font_size(12)),
            );
            doc.push(elements::Paragraph::new(format!("Transação: {}", gateway_id)));
            doc.push(elements::Break::new(1));

            let code = QrCode::new(gateway_id.as_bytes())
                .map_err(|e| AppError::InternalServerError(anyhow::Error::msg(e.to_string())))?;

            // Renderiza para imagem
            let image_buffer = code.render::<Luma<u8>>().build();
            let dynamic_image = image::DynamicImage::ImageLuma8(image_buffer);

            let pdf_image = genpdf::elements::Image::from_dynamic_image(dynamic_image)
                .map_err(|e| AppError::InternalServerError(anyhow::Error::msg(e.to_string())))?
                .with_scale(genpdf::Scale::new(0.5, 0.5));

            doc.push(pdf_image);
        }

        // --- RODAPÉ ---
        if let Some(verified_at) = payment.verified_at {
            doc.push(elements::Break::new(2));
            doc.push(
                elements::Paragraph::new(format!(
                    "Verificado em {} ({})",
                    verified_at.format("%d/%m/%Y %H:%M"),
                    payment.verification_method.as_deref().unwrap_or("-")
                ))
                .styled(style::Style::new().italic().with_font_size(8)),
            );
        }

        // 3. Renderiza para Buffer (Memória)
        let mut buffer = Vec::new();
        doc.render(&mut buffer)
            .map_err(|e| AppError::InternalServerError(anyhow::Error::msg(e.to_string())))?;

        Ok(buffer)
    }
}
