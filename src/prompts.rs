//! Spanish prompt templates for each planning stage

use crate::models::IntakeParams;
use serde_json::json;

/// System message, user message and sampling temperature for one text call
#[derive(Debug, Clone, PartialEq)]
pub struct TextPrompt {
    pub system: &'static str,
    pub user: String,
    pub temperature: f32,
}

pub const INTAKE_SYSTEM_PROMPT: &str = "Respondé SOLO con JSON válido y breve.";
pub const ITINERARY_SYSTEM_PROMPT: &str = "Devolvé solo itinerario en texto limpio.";
pub const AUDIT_SYSTEM_PROMPT: &str =
    "Actuá como auditor de itinerarios. Respondé SOLO con JSON válido.";
pub const CONTACTS_SYSTEM_PROMPT: &str = "Respondé SOLO con JSON válido.";

/// Pretty JSON with non-ASCII kept as is
pub fn pretty_json<T: serde::Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

/// Ask the model to echo the trip parameters as `{"param": {...}}`
pub fn intake_prompt(params: &IntakeParams) -> TextPrompt {
    let expected = pretty_json(&json!({ "param": params }));
    TextPrompt {
        system: INTAKE_SYSTEM_PROMPT,
        user: format!(
            "Sos un organizador de viajes.\n\
             Devolvé SOLO un JSON válido.\n\n\
             JSON esperado:\n{expected}\n"
        ),
        temperature: 0.2,
    }
}

/// Day-by-day itinerary built from the intake JSON
pub fn itinerary_prompt(intake_json: &str, days: i64) -> TextPrompt {
    TextPrompt {
        system: ITINERARY_SYSTEM_PROMPT,
        user: format!(
            r#"Usá este JSON:

{intake_json}

Generá un itinerario detallado de {days} días.

Formato:
Día N - Zona
09:00-11:00 Actividad
[Si corresponde: (traslado: XX min medio)]
11:15-13:00 Actividad
[Si corresponde: (traslado: XX min medio)]
13:15-14:30 Almuerzo (2 opciones)
[Si corresponde: (traslado: XX min medio)]
15:00-17:00 Actividad
[Si corresponde: (traslado: XX min medio)]
17:15-19:00 Actividad
20:00 Cena (2 opciones)

Reglas adicionales:
- Mostrá tiempos de traslado SOLO cuando cambie el lugar de la actividad.
- No repitas traslado si la siguiente actividad ocurre en el mismo sitio.
- Si el modo de viaje es "Familiar" y "ninos_menores_12" es true:
  - Incluí actividades adaptadas y marcá con 👶.
  - Si alguna actividad no es apta para menores o es muy exigente, marcala con ⚠️ y proponé una "Actividad alternativa" en ese mismo día y horario.
- Si el modo de viaje es "Familiar" pero "ninos_menores_12" es false:
  - NO incluyas actividades adaptadas para niños.
- Considerá la temporada:
  - Si es ALTA → recomendá reservas anticipadas, horarios tempranos y opciones alternativas por alta demanda.
  - Si es BAJA → advertí sobre posibles cierres o menor disponibilidad de actividades.
- Al final de cada día, incluir un breve resumen con tips.
"#
        ),
        temperature: 0.4,
    }
}

/// Quality audit returning `{"alertas": {"Día N": [...]}}`
pub fn audit_prompt(itinerary: &str) -> TextPrompt {
    TextPrompt {
        system: AUDIT_SYSTEM_PROMPT,
        user: format!(
            r#"Revisá el siguiente itinerario y generá un JSON con advertencias relevantes agrupadas por día.

Itinerario:
{itinerary}

Devolvé SOLO un JSON con este formato:
{{
  "alertas": {{
    "Día 2": [
      "Actividad X puede no ser apta para niños",
      "Traslado mayor a 60 minutos"
    ],
    "Día 5": [
      "Actividad Y puede ser excesiva"
    ]
  }}
}}

Reglas:
- Agrupá todas las advertencias bajo el día correspondiente.
- Marcá traslados mayores a 60 minutos.
- Detectá jornadas con exceso de actividades según el modo elegido.
- Señalá actividades no aptas para niños si hay menores de 12 años.
- Si no hay niños, no incluyas esas advertencias.
- Si la temporada es "alta" → incluir advertencia de "Reserva anticipada".
- Si la temporada es "baja" → incluir advertencia de "Atracciones cerradas por estacionalidad".
- No incluyas advertencias de temporada que no correspondan.
- Si no hay alertas para un día, no incluyas ese día en el JSON.
"#
        ),
        temperature: 0.2,
    }
}

/// Simulated contact lookup for the detected places
pub fn contacts_prompt(places: &[&str]) -> TextPrompt {
    let places = pretty_json(places);
    TextPrompt {
        system: CONTACTS_SYSTEM_PROMPT,
        user: format!(
            r#"A partir de la siguiente lista de lugares y servicios detectados en el itinerario:

{places}

Simulá que buscás en la web sus datos de contacto.

Devolvé SOLO un JSON con este formato:
[
  {{
    "nombre": "Nombre del lugar o empresa",
    "tipo": "hotel | restaurante | bodega | actividad | excursión | transporte",
    "web": "URL ficticia o realista",
    "telefono": "Teléfono ficticio con código de país",
    "email": "Email ficticio con formato válido"
  }}
]

Reglas:
- Si aparecen hoteles, restaurantes, bodegas, actividades o excursiones → devolvé contactos de esos lugares.
- Si en el itinerario figuran medios de transporte local como autos de alquiler, remises, taxis o transfers → incluí también empresas proveedoras de ese servicio en la zona del destino.
- Los datos deben ser plausibles y consistentes con Argentina.
"#
        ),
        temperature: 0.4,
    }
}

/// Illustrated vintage map with scenes picked from the key points
pub fn map_image_prompt(destination: &str, key_points: &[&str]) -> String {
    let key_points = key_points.join(" | ");
    format!(
        r#"Mapa turístico ilustrado estilo vintage de {destination} basado en el itinerario, con textura de papel antiguo y paleta cálida (beige, terracota, verdes suaves).
Base: contorno simplificado de {destination} o del área de viaje, con líneas curvas que conectan varios círculos grandes.
Dentro de cada círculo, mostrar **pequeñas escenas realistas del destino** (sin texto), seleccionadas a partir del itinerario y estos puntos clave:
{key_points}

Reglas para elegir las 4 escenas (adaptadas a {destination}):
- Si {destination} es de montaña/lago → usar: cordillera/cumbres, lago/valle, ciclista o senderismo local, bosque/parque típico.
- Si es de costa → usar: playa/olas, puerto/muelle, embarcación local, acantilado o dunas.
- Si es urbano → usar: arquitectura icónica/plaza central, mercado o café típico, parque urbano, actividad cultural.
- Si es zona vitivinícola o gastronómica → incluir viñedos con racimos, copa/bodega (realista), plato regional.
- Si hay nieve → incluir escena invernal (centro de ski o paisaje nevado).
- Priorizar escenas mencionadas en el itinerario; si alguna falta, sustituir por el hito natural/cultural más representativo de {destination}.
- Estilo híbrido: mapa e iconografía mínima ilustrada + círculos con escenas **realistas** (pintura/foto-look).
- **No agregar texto ni etiquetas en ningún lugar**.
Formato: horizontal 16:9, PNG, composición limpia y nítida, coherente y equilibrada.
"#
    )
}

/// Travel poster titled after the destination, subtitled with the travel mode
pub fn flyer_image_prompt(destination: &str, subtitle: &str) -> String {
    format!(
        "Flyer turístico 16:9 para {destination}, estilo travel-poster moderno.\n\
         Título: 'Escapada a {destination}'.\n\
         Subtítulo: {subtitle}.\n\
         Imagen icónica del lugar, composición limpia, margen seguro para texto.\n\
         Devuelve únicamente la imagen en PNG.\n"
    )
}
